//! The mediator state machine.
//!
//! [`Mediator`] owns the [`RequestRegistry`] and [`ApprovalCache`] and applies
//! one [`Command`] at a time. It has no knowledge of tasks or channels; the
//! [`actor`](crate::actor) module wraps it in a mailbox so that commands from
//! many tabs are serialized.
//!
//! # Request lifecycle
//!
//! ```text
//! NONE ──request──▶ PENDING ──approve──▶ APPROVED
//!   │                  └─────reject────▶ REJECTED
//!   └──request (gate grants)──────────▶ APPROVED
//! ```
//!
//! PENDING is not a suspended call. It is an entry in the registry that stays
//! until a later approve or reject for the same origin, or until a newer
//! request from that origin supersedes it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::ApprovalCache;
use crate::error::{ApprovalError, ApprovalResult};
use crate::gate::{AccessGate, PrivacyModeSource, UnlockStateSource, Verdict};
use crate::message::{InboundMessage, OutboundMessage, Target};
use crate::origin::Origin;
use crate::popup::{NoPopup, Popup};
use crate::registry::{DuplicatePolicy, ProviderRequest, RequestRegistry};
use crate::transport::{DetachedTransport, NoopNotifier, PublicStateNotifier, Transport};

/// Everything the mediator can be asked to do.
///
/// Page messages arrive as [`Command::Inbound`]. The remaining variants are
/// trusted: they come from the wallet UI or the session layer, never from a
/// page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A decoded page message.
    Inbound(InboundMessage),
    /// The user approved `origin`.
    Approve(Origin),
    /// The user rejected `origin`.
    Reject(Origin),
    /// The wallet locked: clear approvals and tell every context.
    Lock,
    /// Clear approvals without broadcasting.
    ClearApprovedOrigins,
}

impl From<InboundMessage> for Command {
    fn from(message: InboundMessage) -> Self {
        Self::Inbound(message)
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// `origin` was granted access, either by the user or by the gate.
    Granted {
        /// The granted origin.
        origin: Origin,
        /// Registry entries resolved by the grant.
        resolved: usize,
    },
    /// `origin` is waiting for the user.
    Pending {
        /// The waiting request.
        request: ProviderRequest,
    },
    /// `origin` was rejected.
    Rejected {
        /// The rejected origin.
        origin: Origin,
        /// Registry entries resolved by the rejection.
        resolved: usize,
    },
    /// Access confirmed by policy alone; nothing was recorded.
    AmbientGrant,
    /// A query was answered.
    Answered(OutboundMessage),
    /// Nothing happened.
    Ignored,
    /// Approvals were cleared and the lock was broadcast.
    Locked {
        /// Number of approvals forgotten.
        cleared: usize,
    },
    /// Approvals were cleared.
    Cleared {
        /// Number of approvals forgotten.
        cleared: usize,
    },
}

impl Transition {
    /// Check if this transition granted provider access.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. } | Self::AmbientGrant)
    }

    /// Check if this transition left a request waiting for the user.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Single-writer owner of the access-control state.
pub struct Mediator {
    registry: RequestRegistry,
    cache: ApprovalCache,
    unlock: Arc<dyn UnlockStateSource>,
    privacy: Arc<dyn PrivacyModeSource>,
    popup: Arc<dyn Popup>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn PublicStateNotifier>,
}

impl Mediator {
    /// Start building a mediator.
    #[must_use]
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// Apply one command.
    pub fn handle(&mut self, command: Command) -> Transition {
        match command {
            Command::Inbound(message) => self.handle_inbound(message),
            Command::Approve(origin) => self.approve(origin),
            Command::Reject(origin) => self.reject(&origin),
            Command::Lock => self.lock(),
            Command::ClearApprovedOrigins => {
                let cleared = self.clear_approved_origins();
                Transition::Cleared { cleared }
            },
        }
    }

    /// Apply a page message.
    pub fn handle_inbound(&mut self, message: InboundMessage) -> Transition {
        match message {
            InboundMessage::ProviderRequest { origin } => self.handle_provider_request(origin),
            InboundMessage::IsApprovedQuery { origin } => {
                let reply = OutboundMessage::AnswerIsApproved {
                    is_approved: self.gate().is_approved(&origin),
                };
                self.send(reply.clone(), Target::Active);
                Transition::Answered(reply)
            },
            InboundMessage::IsUnlockedQuery => {
                let reply = OutboundMessage::AnswerIsUnlocked {
                    is_unlocked: self.gate().is_unlocked(),
                };
                self.send(reply.clone(), Target::Active);
                Transition::Answered(reply)
            },
            InboundMessage::PrivacyStatusQuery => self.handle_privacy_status(),
        }
    }

    fn handle_provider_request(&mut self, origin: Origin) -> Transition {
        let enqueued = self.registry.enqueue(origin.clone());
        if enqueued.superseded > 0 {
            debug!(%origin, superseded = enqueued.superseded, "superseded pending request");
        }

        match self.gate().verdict(&origin) {
            Verdict::Grant => {
                debug!(%origin, "granted without prompting");
                self.approve(origin)
            },
            Verdict::Ask => {
                debug!(%origin, request_id = %enqueued.request.id, "awaiting user decision");
                self.popup.open();
                Transition::Pending {
                    request: enqueued.request,
                }
            },
        }
    }

    fn handle_privacy_status(&self) -> Transition {
        if self.privacy.privacy_mode() {
            return Transition::Ignored;
        }
        self.send(OutboundMessage::ProviderApproved, Target::Active);
        self.notifier.notify_changed();
        Transition::AmbientGrant
    }

    /// Grant `origin` access and remember the approval.
    pub fn approve(&mut self, origin: Origin) -> Transition {
        self.popup.close();
        self.send(OutboundMessage::ProviderApproved, Target::Active);
        self.notifier.notify_changed();
        let resolved = self.registry.remove_by_origin(&origin);
        self.cache.approve(origin.clone());
        info!(%origin, resolved, "provider access approved");
        Transition::Granted { origin, resolved }
    }

    /// Deny `origin`. Nothing is recorded, so its next request asks again.
    pub fn reject(&mut self, origin: &Origin) -> Transition {
        self.popup.close();
        self.send(OutboundMessage::ProviderRejected, Target::Active);
        let resolved = self.registry.remove_by_origin(origin);
        info!(%origin, resolved, "provider access rejected");
        Transition::Rejected {
            origin: origin.clone(),
            resolved,
        }
    }

    /// Forget every approval, returning how many were cleared.
    ///
    /// Pending requests are untouched.
    pub fn clear_approved_origins(&mut self) -> usize {
        let cleared = self.cache.len();
        self.cache.clear();
        debug!(cleared, "cleared approved origins");
        cleared
    }

    /// React to the wallet locking.
    pub fn lock(&mut self) -> Transition {
        let cleared = self.clear_approved_origins();
        self.send(OutboundMessage::WalletLocked, Target::All);
        info!(cleared, pending = self.registry.len(), "wallet locked");
        Transition::Locked { cleared }
    }

    /// Read-only decision view over the current state.
    #[must_use]
    pub fn gate(&self) -> AccessGate<'_> {
        AccessGate::new(self.privacy.as_ref(), self.unlock.as_ref(), &self.cache)
    }

    /// The pending-request registry.
    #[must_use]
    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    /// The approval cache.
    #[must_use]
    pub fn cache(&self) -> &ApprovalCache {
        &self.cache
    }

    fn send(&self, message: OutboundMessage, target: Target) {
        let action = message.action();
        if let Err(e) = self.transport.send(message, target) {
            warn!(action, %target, "failed to deliver outbound message: {e}");
        }
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Mediator`].
///
/// The unlock-state and privacy-mode sources are required. Popup, transport
/// and notifier default to their no-op implementations.
#[derive(Default)]
pub struct MediatorBuilder {
    unlock: Option<Arc<dyn UnlockStateSource>>,
    privacy: Option<Arc<dyn PrivacyModeSource>>,
    popup: Option<Arc<dyn Popup>>,
    transport: Option<Arc<dyn Transport>>,
    notifier: Option<Arc<dyn PublicStateNotifier>>,
    duplicate_policy: DuplicatePolicy,
}

impl MediatorBuilder {
    /// Set the unlock-state source.
    #[must_use]
    pub fn unlock_state(mut self, source: Arc<dyn UnlockStateSource>) -> Self {
        self.unlock = Some(source);
        self
    }

    /// Set the privacy-mode source.
    #[must_use]
    pub fn privacy_mode(mut self, source: Arc<dyn PrivacyModeSource>) -> Self {
        self.privacy = Some(source);
        self
    }

    /// Attach an approval popup.
    #[must_use]
    pub fn popup(mut self, popup: Arc<dyn Popup>) -> Self {
        self.popup = Some(popup);
        self
    }

    /// Attach an outbound transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Attach a public-state notifier.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn PublicStateNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Choose how repeated requests from a pending origin are recorded.
    #[must_use]
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Build the mediator.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::MissingCollaborator`] if the unlock-state or
    /// privacy-mode source was not set.
    pub fn build(self) -> ApprovalResult<Mediator> {
        let unlock = self
            .unlock
            .ok_or(ApprovalError::MissingCollaborator("unlock state source"))?;
        let privacy = self
            .privacy
            .ok_or(ApprovalError::MissingCollaborator("privacy mode source"))?;
        Ok(Mediator {
            registry: RequestRegistry::with_policy(self.duplicate_policy),
            cache: ApprovalCache::new(),
            unlock,
            privacy,
            popup: self
                .popup
                .unwrap_or_else(|| Arc::new(NoPopup) as Arc<dyn Popup>),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(DetachedTransport) as Arc<dyn Transport>),
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(NoopNotifier) as Arc<dyn PublicStateNotifier>),
        })
    }
}

impl std::fmt::Debug for MediatorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediatorBuilder")
            .field("has_unlock", &self.unlock.is_some())
            .field("has_privacy", &self.privacy.is_some())
            .field("has_popup", &self.popup.is_some())
            .field("has_transport", &self.transport.is_some())
            .field("has_notifier", &self.notifier.is_some())
            .field("duplicate_policy", &self.duplicate_policy)
            .finish()
    }
}
