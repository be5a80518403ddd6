//! Outbound delivery and public-state notification.

use crate::error::ApprovalResult;
use crate::message::{OutboundMessage, Target};

/// Delivers outbound messages to requesting contexts.
///
/// Routing a message to the right tab is the implementation's concern; the
/// mediator only names the message and a [`Target`].
pub trait Transport: Send + Sync {
    /// Send `message` to the contexts selected by `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Transport`](crate::ApprovalError::Transport)
    /// if delivery failed. The mediator logs the failure and keeps the state
    /// change it already made.
    fn send(&self, message: OutboundMessage, target: Target) -> ApprovalResult<()>;
}

/// Transport used when nothing is attached. Every send succeeds and goes
/// nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedTransport;

impl Transport for DetachedTransport {
    fn send(&self, message: OutboundMessage, target: Target) -> ApprovalResult<()> {
        tracing::trace!(message = message.action(), %target, "no transport attached, dropping");
        Ok(())
    }
}

/// Triggers a re-broadcast of ambient wallet state (network, accounts) to all
/// origins, so a newly granted origin can read it immediately.
pub trait PublicStateNotifier: Send + Sync {
    /// Signal that public wallet state should be re-published.
    fn notify_changed(&self);
}

/// Notifier used when no public-state store is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl PublicStateNotifier for NoopNotifier {
    fn notify_changed(&self) {}
}
