//! The user-facing approval surface.

/// Opens and closes the approval popup.
///
/// There is a single popup surface shared by every origin, so both calls must
/// be idempotent: overlapping transitions may open an already open popup or
/// close one that was never opened. The mediator never waits on the popup; the
/// user's decision comes back later as an independent approve or reject.
pub trait Popup: Send + Sync {
    /// Make the approval surface visible.
    fn open(&self);

    /// Dismiss the approval surface.
    fn close(&self);
}

/// Popup for headless or embedded contexts with no approval surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPopup;

impl Popup for NoPopup {
    fn open(&self) {}

    fn close(&self) {}
}
