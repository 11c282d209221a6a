use std::fmt;

/// Normalized lifecycle of one peer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Connecting,
    Connected,
    /// The link is interrupted but the transport still exists; the peer may
    /// come back without renegotiation.
    Disconnected,
    /// Terminal. Distinguishable from [`SessionState::Closed`] so the UI can
    /// offer a retry instead of plain teardown.
    Failed,
    /// Terminal, clean teardown.
    Closed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Failed | SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::New => "new",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Disconnected => "disconnected",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        };
        write!(f, "{name}")
    }
}
