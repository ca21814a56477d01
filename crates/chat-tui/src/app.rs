use std::time::{Duration, Instant};

use chat_core::{sanitize_paste, ChatError, Controller, Message, Submission, ThreadState};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use tokio::sync::watch;
use tracing::debug;
use tui_input::backend::crossterm::EventHandler;
use tui_input::{Input, InputRequest};

const NOTICE_TTL: Duration = Duration::from_secs(4);

/// What the event loop should do after a key press.
#[derive(Debug)]
pub enum Command {
    None,
    Quit,
    Dispatch(Submission),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    shown_at: Instant,
}

/// Vertical position of the history view. Follows the newest message until
/// the user scrolls away from the bottom.
#[derive(Debug, Clone, Copy)]
pub struct Scroll {
    offset: usize,
    follow: bool,
    max: usize,
    page: usize,
}

impl Default for Scroll {
    fn default() -> Self {
        Self {
            offset: 0,
            follow: true,
            max: 0,
            page: 1,
        }
    }
}

impl Scroll {
    /// Fits the offset to `total` lines shown `height` at a time.
    pub fn settle(&mut self, total: usize, height: usize) -> usize {
        self.max = total.saturating_sub(height);
        self.page = height.max(1);
        if self.follow || self.offset >= self.max {
            self.offset = self.max;
            self.follow = true;
        }
        self.offset
    }

    pub fn follow(&mut self) {
        self.follow = true;
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn up(&mut self, lines: usize) {
        self.follow = false;
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_add(lines).min(self.max);
        if self.offset >= self.max {
            self.follow = true;
        }
    }

    pub fn page_up(&mut self) {
        self.up(self.page);
    }

    pub fn page_down(&mut self) {
        self.down(self.page);
    }
}

pub struct App {
    controller: Controller,
    changes: watch::Receiver<ThreadState>,
    /// Latest conversation state published by the controller
    pub thread: ThreadState,
    /// User input buffer
    pub input: Input,
    pub scroll: Scroll,
    pub notice: Option<Notice>,
    /// Where questions go, shown in the history title
    pub endpoint: String,
    /// Spinner frame counter, advanced on every tick
    pub ticks: usize,
}

impl App {
    pub fn new(controller: Controller, endpoint: impl Into<String>) -> Self {
        let mut changes = controller.subscribe();
        let thread = changes.borrow_and_update().clone();
        Self {
            controller,
            changes,
            thread,
            input: Input::default(),
            scroll: Scroll::default(),
            notice: None,
            endpoint: endpoint.into(),
            ticks: 0,
        }
    }

    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.thread.is_pending()
    }

    /// Pulls the latest snapshot; any new message snaps the view to the bottom.
    pub fn sync(&mut self) {
        if !self.changes.has_changed().unwrap_or(false) {
            return;
        }
        let next = self.changes.borrow_and_update().clone();
        if next.messages().len() != self.thread.messages().len() {
            self.scroll.follow();
        }
        self.thread = next;
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Command {
        if key.kind != KeyEventKind::Press {
            return Command::None;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Command::Quit;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => {
                self.input.reset();
                self.controller.set_draft("");
                Command::None
            }
            KeyCode::PageUp => {
                self.scroll.page_up();
                Command::None
            }
            KeyCode::PageDown => {
                self.scroll.page_down();
                Command::None
            }
            _ => {
                if self.input.handle_event(&Event::Key(key)).is_some() {
                    self.controller.set_draft(self.input.value());
                }
                Command::None
            }
        }
    }

    /// Inserts pasted text at the cursor. The input line is single-line, so
    /// line breaks and tabs become spaces.
    pub fn on_paste(&mut self, raw: &str) {
        let text = sanitize_paste(raw);
        for c in text.chars() {
            let c = if matches!(c, '\n' | '\t') { ' ' } else { c };
            self.input.handle(InputRequest::InsertChar(c));
        }
        self.controller.set_draft(self.input.value());
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll.up(1),
            MouseEventKind::ScrollDown => self.scroll.down(1),
            _ => {}
        }
    }

    pub fn on_settled(&mut self, result: Result<Message, ChatError>) {
        match result {
            Ok(message) => debug!(id = %message.id, "answer shown"),
            Err(err) => self.show(NoticeLevel::Error, format!("Request failed: {err}")),
        }
    }

    fn submit(&mut self) -> Command {
        match self.controller.submit_draft() {
            Ok(submission) => {
                self.input.reset();
                self.scroll.follow();
                Command::Dispatch(submission)
            }
            Err(ChatError::Busy) => {
                self.show(NoticeLevel::Info, "Still waiting for the previous answer");
                Command::None
            }
            Err(err) => {
                self.show(NoticeLevel::Error, err.to_string());
                Command::None
            }
        }
    }

    fn show(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
            shown_at: Instant::now(),
        });
    }
}
