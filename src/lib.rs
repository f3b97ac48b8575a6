pub mod config;
pub mod credentials;
pub mod error;
pub mod lifecycle;
pub mod marks;
pub mod notify;
pub mod output;
pub mod qualify;
pub mod results;
pub mod scoring;
pub mod store;

pub use error::{JudgeError, Result};
