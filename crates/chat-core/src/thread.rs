use std::fmt;
use std::mem;

use uuid::Uuid;

use crate::error::{ChatError, Result, TransportError};
use crate::message::Message;

/// Ties a transport outcome to the submission that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(Uuid);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An accepted question, waiting to be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    pub question: String,
}

/// Conversation state: the append-only message list, the draft being typed
/// and the in-flight submission, if any.
///
/// All transitions are synchronous and free of I/O, so the same reducer backs
/// the terminal UI, the line CLI and the tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadState {
    messages: Vec<Message>,
    draft: String,
    pending: Option<Ticket>,
}

impl ThreadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Accepts `text` verbatim (empty and whitespace-only included): appends
    /// the user message, clears the draft and marks the thread pending.
    /// Rejected without any change while another question is in flight.
    pub fn submit_question(&mut self, text: impl Into<String>) -> Result<Submission> {
        if self.pending.is_some() {
            return Err(ChatError::Busy);
        }

        let question = text.into();
        let message = Message::user(question.clone());
        let ticket = Ticket(message.id);

        self.messages.push(message);
        self.draft.clear();
        self.pending = Some(ticket);

        Ok(Submission { ticket, question })
    }

    pub fn submit_draft(&mut self) -> Result<Submission> {
        if self.pending.is_some() {
            return Err(ChatError::Busy);
        }
        let text = mem::take(&mut self.draft);
        self.submit_question(text)
    }

    /// Settles the pending submission. A response appends one chat-bot
    /// message; a failure appends nothing. Either way the thread is idle
    /// afterwards.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<String, TransportError>,
    ) -> Result<Message> {
        if self.pending != Some(ticket) {
            return Err(ChatError::StaleTicket(ticket));
        }
        self.pending = None;

        let response = outcome?;
        let message = Message::chat_bot(response);
        self.messages.push(message.clone());
        Ok(message)
    }
}
