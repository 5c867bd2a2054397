/// The lifecycle states a [`super::Connection`] moves through.
///
/// `Invalid` is terminal and absorbing: [`super::Connection::set_state`] is
/// a no-op once it has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, connect-worker not yet scheduled.
    Init,
    /// The connect-worker's handshake GET is in flight.
    Handshake,
    /// Handshake succeeded; a transport is being instantiated and connected.
    Connecting,
    /// A transport is connected and operational.
    Ready,
    /// The transport dropped or faulted; a reconnect may be scheduled.
    Interrupted,
    /// Terminal. Cleanup has run or is running; no further transitions.
    Invalid,
}

impl ConnectionState {
    /// Whether this state is the terminal, absorbing one.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Invalid)
    }
}
