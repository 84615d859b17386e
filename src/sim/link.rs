/// Link-cable state as seen by the card screen.
///
/// While a link partner is connected, redraw work is spread one step per
/// tick, and a backed-up receive queue stalls the flip midpoint until the
/// queue drains.

pub trait LinkStatus {
    /// A remote player is connected.
    fn is_linked(&self) -> bool;
    /// The receive queue holds more than it can absorb this frame.
    fn recv_queue_backed_up(&self) -> bool;
}

/// No link partner. Never stalls.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl LinkStatus for Offline {
    fn is_linked(&self) -> bool {
        false
    }

    fn recv_queue_backed_up(&self) -> bool {
        false
    }
}
