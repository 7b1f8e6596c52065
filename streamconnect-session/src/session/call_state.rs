/// Lifecycle of a call, from dialing in to hanging up.
///
/// `Terminated` is terminal. `Disconnected` is not: the session keeps
/// listening and a fresh peer (or the same one rejoining) renegotiates
/// from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    AcquiringMedia,
    WaitingForPeer,
    Negotiating,
    Connected,
    Disconnected,
    Terminated,
}

impl CallState {
    /// States in which a newly announced peer can be greeted. Media must
    /// already be held, and a finished call greets nobody.
    pub fn accepts_peers(self) -> bool {
        matches!(
            self,
            CallState::WaitingForPeer
                | CallState::Negotiating
                | CallState::Connected
                | CallState::Disconnected
        )
    }

    pub fn is_terminal(self) -> bool {
        self == CallState::Terminated
    }
}
