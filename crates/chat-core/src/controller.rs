use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::{Result, TransportError};
use crate::message::Message;
use crate::thread::{Submission, ThreadState};
use crate::transport::ChatTransport;

/// Shared handle over the conversation. Cheap to clone; every clone drives
/// the same thread. Views observe it through [`Controller::subscribe`].
#[derive(Clone)]
pub struct Controller {
    state: Arc<Mutex<ThreadState>>,
    changes: Arc<watch::Sender<ThreadState>>,
    transport: Arc<dyn ChatTransport>,
    deadline: Duration,
}

impl Controller {
    pub fn new(transport: Arc<dyn ChatTransport>, deadline: Duration) -> Self {
        let (changes, _) = watch::channel(ThreadState::new());
        Self {
            state: Arc::new(Mutex::new(ThreadState::new())),
            changes: Arc::new(changes),
            transport,
            deadline,
        }
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ThreadState> {
        self.changes.subscribe()
    }

    pub fn snapshot(&self) -> ThreadState {
        self.lock().clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.update(|state| state.set_draft(text));
    }

    pub fn submit_question(&self, text: impl Into<String>) -> Result<Submission> {
        let submission = self.update(|state| state.submit_question(text))?;
        info!(ticket = %submission.ticket, "question submitted");
        Ok(submission)
    }

    pub fn submit_draft(&self) -> Result<Submission> {
        let submission = self.update(ThreadState::submit_draft)?;
        info!(ticket = %submission.ticket, "question submitted");
        Ok(submission)
    }

    /// Runs the transport call for `submission` under the configured deadline
    /// and settles it. The pending flag is cleared whatever the outcome.
    pub async fn dispatch(&self, submission: Submission) -> Result<Message> {
        let Submission { ticket, question } = submission;

        let outcome = match timeout(self.deadline, self.transport.send(&question)).await {
            Ok(result) => result.map(|payload| payload.response),
            Err(_) => Err(TransportError::Timeout(self.deadline)),
        };

        if let Err(err) = &outcome {
            warn!(%ticket, error = %err, "chat request failed");
        }

        let reply = self.update(|state| state.complete(ticket, outcome))?;
        info!(%ticket, "answer appended");
        Ok(reply)
    }

    /// Submits `text` and waits for the answer.
    pub async fn ask(&self, text: impl Into<String>) -> Result<Message> {
        let submission = self.submit_question(text)?;
        self.dispatch(submission).await
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ThreadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut ThreadState) -> R) -> R {
        let mut state = self.lock();
        let out = f(&mut state);
        // Published under the lock so subscribers see changes in order.
        self.changes.send_replace(state.clone());
        out
    }
}
