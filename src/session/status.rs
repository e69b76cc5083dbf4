//! Session status reporting.

/// Lifecycle status of a [`Session`](crate::Session).
///
/// A session is either inactive or active; there is no intermediate state.
/// [`start`](crate::Session::start) moves it to `Active` when the handler
/// opens; committing, destroying or aborting the session moves it back to
/// `None` when the handler closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session is running.
    #[default]
    None,
    /// A session has been started and not yet closed.
    Active,
}

impl SessionStatus {
    /// Check whether the session is running.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}
