pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod message;
pub mod thread;
pub mod transport;

pub use config::ClientConfig;
pub use controller::Controller;
pub use error::{ChatError, TransportError};
pub use input::sanitize_paste;
pub use message::{CreatedBy, Message};
pub use thread::{Submission, ThreadState, Ticket};
pub use transport::{ChatRequest, ChatResponse, ChatTransport, HttpTransport};
