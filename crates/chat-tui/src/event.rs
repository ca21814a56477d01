use std::time::Duration;

use chat_core::{ChatError, Message};
use crossterm::event::{Event as CrosstermEvent, EventStream};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

pub enum Event {
    Terminal(CrosstermEvent),
    Tick,
    /// A dispatched question came back (or failed).
    Settled(Result<Message, ChatError>),
}

/// Merges terminal input, a redraw tick and transport results into one
/// stream for the render loop.
pub struct EventHandler {
    sender: mpsc::Sender<Event>,
    receiver: mpsc::Receiver<Event>,
    tasks: Vec<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(32);

        let tick = {
            let sender = sender.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tick_rate);
                loop {
                    interval.tick().await;
                    if sender.send(Event::Tick).await.is_err() {
                        break;
                    }
                }
            })
        };

        let input = {
            let sender = sender.clone();
            tokio::spawn(async move {
                let mut reader = EventStream::new();
                while let Some(event) = reader.next().await {
                    match event {
                        Ok(event) => {
                            if sender.send(Event::Terminal(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, "terminal input failed");
                            break;
                        }
                    }
                }
            })
        };

        Self {
            sender,
            receiver,
            tasks: vec![tick, input],
        }
    }

    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.sender.clone()
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
