//! Application-wide error types.
//!
//! Only [`AppError`] ever reaches `main`. Failures inside the remote config
//! fetch and the pricing store are absorbed where they happen and carry their
//! own leaf error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("server error: {0}")]
    Server(String),
}
