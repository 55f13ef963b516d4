/// Where a client is in its connection lifecycle.
///
/// `Idle -> Connecting -> AwaitingRegistration -> Connected -> Disconnected`,
/// and back to `Connecting` on a new `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// TCP connect in progress.
    Connecting,
    /// Socket open, NICK/USER sent, waiting for the welcome numeric.
    AwaitingRegistration,
    Connected,
    Disconnected,
}

impl Phase {
    /// True while a session is live or being set up.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Phase::Connecting | Phase::AwaitingRegistration | Phase::Connected
        )
    }
}

/// Registration status as seen by collaborators.
///
/// `current_nick` and `server_name` are empty whenever `connected` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub current_nick: String,
    pub server_name: String,
}
