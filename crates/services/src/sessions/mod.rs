mod observer;
mod service;
mod view;

// Public API of the session subsystem.
pub use crate::error::QuizSessionError;
pub use observer::{SessionEvent, SessionObserver};
pub use service::{QuizSession, SessionMode};
pub use view::{SessionSnapshot, SessionStatus};
