#![forbid(unsafe_code)]

pub mod answer_key;
pub mod error;
pub mod grader;
pub mod model;
pub mod navigation;
pub mod time;

pub use error::Error;
pub use time::Clock;
