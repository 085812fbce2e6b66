//! Lifecycle of an evaluation session.

/// Where a session is in its one-shot initialization.
///
/// `Uninitialized -> Initializing -> Ready | Failed`; `Ready` and `Failed` are final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    /// The runtime is loaded and reported `version`.
    Ready { version: String },
    /// The runtime could not be loaded.
    Failed { reason: String },
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SessionState::Failed { .. })
    }

    /// Initialization has finished one way or the other.
    pub fn is_settled(&self) -> bool {
        self.is_ready() || self.is_failed()
    }
}
