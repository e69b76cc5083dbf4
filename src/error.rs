//! Error types for session-kit.

use thiserror::Error;

/// Main error type for session-kit operations.
///
/// These variants cover caller misuse of the lifecycle API. Operational
/// failures such as a backend refusing to open or a write going wrong are
/// reported through boolean results instead, so callers can degrade
/// gracefully without unwinding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session is already active and the operation requires it not to be.
    #[error("session already started")]
    AlreadyStarted,

    /// The operation requires an active session and none is running.
    #[error("cannot {0}: session is not active")]
    NotActive(&'static str),

    /// A custom id prefix contains characters outside the id alphabet.
    #[error("invalid id prefix {0:?}: only alphanumeric characters, ',' and '-' are allowed")]
    InvalidIdPrefix(String),
}

/// Convenience Result type for session-kit operations.
pub type Result<T> = std::result::Result<T, SessionError>;
