//! Mailbox task that serializes every transition through one [`Mediator`].
//!
//! # Design
//!
//! [`spawn`] moves the mediator into a Tokio task and returns a cloneable
//! [`MediatorHandle`]. Every handle call, reads included, goes through the
//! same `mpsc` mailbox, so messages from different tabs are applied strictly
//! in arrival order and no reader can observe a half-applied transition.
//!
//! The actor registers no listeners of its own. Whoever owns the transport
//! feeds page messages in, typically with [`forward_inbound`].
//!
//! After each command that changes the pending list, the actor publishes a
//! fresh snapshot on a `watch` channel for approval UIs.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{ApprovalError, ApprovalResult};
use crate::mediator::{Command, Mediator, Transition};
use crate::message::InboundMessage;
use crate::origin::Origin;
use crate::registry::ProviderRequest;

/// Default mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

enum Envelope {
    Command {
        command: Command,
        reply: Option<oneshot::Sender<Transition>>,
    },
    IsApproved {
        origin: Origin,
        reply: oneshot::Sender<bool>,
    },
    IsUnlocked {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<ProviderRequest>>,
    },
}

/// Cloneable handle to a running mediator.
///
/// The actor stops once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct MediatorHandle {
    tx: mpsc::Sender<Envelope>,
    requests: watch::Receiver<Vec<ProviderRequest>>,
}

/// Spawn `mediator` on the current Tokio runtime.
///
/// A `capacity` of zero is treated as one.
#[must_use]
pub fn spawn(mediator: Mediator, capacity: usize) -> (MediatorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (requests_tx, requests_rx) = watch::channel(mediator.registry().snapshot());
    let task = tokio::spawn(run(mediator, rx, requests_tx));
    (
        MediatorHandle {
            tx,
            requests: requests_rx,
        },
        task,
    )
}

async fn run(
    mut mediator: Mediator,
    mut rx: mpsc::Receiver<Envelope>,
    requests_tx: watch::Sender<Vec<ProviderRequest>>,
) {
    info!("Mediator started");
    while let Some(envelope) = rx.recv().await {
        match envelope {
            Envelope::Command { command, reply } => {
                let revision = mediator.registry().revision();
                let transition = mediator.handle(command);
                if mediator.registry().revision() != revision {
                    let snapshot = mediator.registry().snapshot();
                    debug!(pending = snapshot.len(), "publishing pending requests");
                    requests_tx.send_replace(snapshot);
                }
                if let Some(reply) = reply {
                    // Caller may have given up waiting; the transition stands.
                    let _ = reply.send(transition);
                }
            },
            Envelope::IsApproved { origin, reply } => {
                let _ = reply.send(mediator.gate().is_approved(&origin));
            },
            Envelope::IsUnlocked { reply } => {
                let _ = reply.send(mediator.gate().is_unlocked());
            },
            Envelope::Snapshot { reply } => {
                let _ = reply.send(mediator.registry().snapshot());
            },
        }
    }
    info!("Mediator mailbox closed, stopping");
}

impl MediatorHandle {
    /// Apply `command` and wait for the resulting transition.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn dispatch(&self, command: Command) -> ApprovalResult<Transition> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::Command {
            command,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| ApprovalError::MediatorClosed)
    }

    /// Queue `command` without waiting for it to be applied.
    ///
    /// Ordering relative to other commands from this and every other handle
    /// is still arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn post(&self, command: Command) -> ApprovalResult<()> {
        self.send(Envelope::Command {
            command,
            reply: None,
        })
        .await
    }

    /// Apply a page message.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn inbound(&self, message: InboundMessage) -> ApprovalResult<Transition> {
        self.dispatch(Command::Inbound(message)).await
    }

    /// Record the user's approval of `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn approve(&self, origin: impl Into<Origin>) -> ApprovalResult<Transition> {
        self.dispatch(Command::Approve(origin.into())).await
    }

    /// Record the user's rejection of `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn reject(&self, origin: impl Into<Origin>) -> ApprovalResult<Transition> {
        self.dispatch(Command::Reject(origin.into())).await
    }

    /// Tell the mediator the wallet locked.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn lock(&self) -> ApprovalResult<Transition> {
        self.dispatch(Command::Lock).await
    }

    /// Forget every approval without broadcasting a lock.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn clear_approved_origins(&self) -> ApprovalResult<Transition> {
        self.dispatch(Command::ClearApprovedOrigins).await
    }

    /// Policy-level approval of `origin`, evaluated in mailbox order.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn is_approved(&self, origin: impl Into<Origin>) -> ApprovalResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::IsApproved {
            origin: origin.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ApprovalError::MediatorClosed)
    }

    /// Current unlock flag, evaluated in mailbox order.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn is_unlocked(&self) -> ApprovalResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::IsUnlocked { reply }).await?;
        rx.await.map_err(|_| ApprovalError::MediatorClosed)
    }

    /// Pending requests, evaluated in mailbox order.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MediatorClosed`] if the actor has stopped.
    pub async fn pending(&self) -> ApprovalResult<Vec<ProviderRequest>> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::Snapshot { reply }).await?;
        rx.await.map_err(|_| ApprovalError::MediatorClosed)
    }

    /// Watch the pending list. The receiver always holds the latest snapshot.
    #[must_use]
    pub fn subscribe_requests(&self) -> watch::Receiver<Vec<ProviderRequest>> {
        self.requests.clone()
    }

    /// Whether the actor has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, envelope: Envelope) -> ApprovalResult<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| ApprovalError::MediatorClosed)
    }
}

/// Drain raw page messages from `rx` into the mediator.
///
/// Payloads that do not decode to an [`InboundMessage`] are dropped without a
/// reply. Returns the number of messages forwarded once `rx` closes or the
/// mediator stops.
pub async fn forward_inbound(
    handle: MediatorHandle,
    mut rx: mpsc::Receiver<serde_json::Value>,
) -> usize {
    let mut forwarded: usize = 0;
    while let Some(value) = rx.recv().await {
        let message = match InboundMessage::decode(value) {
            Ok(message) => message,
            Err(e) => {
                debug!("ignoring inbound payload: {e}");
                continue;
            },
        };
        if handle.post(Command::Inbound(message)).await.is_err() {
            info!("Mediator closed, inbound forwarder exiting");
            break;
        }
        forwarded = forwarded.saturating_add(1);
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mediator(privacy_mode: bool, unlocked: bool) -> Mediator {
        Mediator::builder()
            .unlock_state(std::sync::Arc::new(move || unlocked))
            .privacy_mode(std::sync::Arc::new(move || privacy_mode))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_round_trip() {
        let (handle, _task) = spawn(mediator(true, false), 8);
        let transition = handle
            .inbound(InboundMessage::ProviderRequest {
                origin: Origin::from("https://a.test"),
            })
            .await
            .unwrap();
        assert!(transition.is_pending());
        assert_eq!(handle.pending().await.unwrap().len(), 1);

        let transition = handle.approve("https://a.test").await.unwrap();
        assert!(transition.is_granted());
        assert!(handle.pending().await.unwrap().is_empty());
        assert!(handle.is_approved("https://a.test").await.unwrap());
        assert!(!handle.is_unlocked().await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_published_on_change() {
        let (handle, _task) = spawn(mediator(true, false), 8);
        let mut requests = handle.subscribe_requests();
        assert!(requests.borrow().is_empty());

        handle
            .inbound(InboundMessage::ProviderRequest {
                origin: Origin::from("https://a.test"),
            })
            .await
            .unwrap();
        requests.changed().await.unwrap();
        assert_eq!(requests.borrow_and_update().len(), 1);

        handle.reject("https://a.test").await.unwrap();
        requests.changed().await.unwrap();
        assert!(requests.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_posts_apply_in_order() {
        let (handle, _task) = spawn(mediator(true, false), 8);
        for origin in ["https://a.test", "https://b.test", "https://c.test"] {
            handle
                .post(Command::Inbound(InboundMessage::ProviderRequest {
                    origin: Origin::from(origin),
                }))
                .await
                .unwrap();
        }
        handle.post(Command::Reject(Origin::from("https://b.test"))).await.unwrap();

        let pending: Vec<String> = handle
            .pending()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.origin.to_string())
            .collect();
        assert_eq!(pending, vec!["https://a.test", "https://c.test"]);
    }

    #[tokio::test]
    async fn test_actor_stops_when_handles_dropped() {
        let (handle, task) = spawn(mediator(false, true), 1);
        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_mediator_reports_error() {
        let (handle, task) = spawn(mediator(false, true), 1);
        task.abort();
        let _ = task.await;
        assert!(handle.is_closed());
        let err = handle.lock().await.unwrap_err();
        assert!(matches!(err, ApprovalError::MediatorClosed));
    }

    #[tokio::test]
    async fn test_forward_inbound_skips_malformed() {
        let (handle, _task) = spawn(mediator(true, false), 8);
        let (tx, rx) = mpsc::channel(8);
        tx.send(json!({"action": "provider-request", "origin": "https://a.test"}))
            .await
            .unwrap();
        tx.send(json!({"action": "approve-provider-request", "origin": "https://a.test"}))
            .await
            .unwrap();
        tx.send(json!({"origin": "https://b.test"})).await.unwrap();
        tx.send(json!(42)).await.unwrap();
        drop(tx);

        let forwarded = forward_inbound(handle.clone(), rx).await;
        assert_eq!(forwarded, 1);

        let pending = handle.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(!handle.is_approved("https://a.test").await.unwrap());
    }
}
