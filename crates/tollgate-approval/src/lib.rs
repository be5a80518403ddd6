//! Tollgate Approval - provider access mediation for wallet origins.
//!
//! This crate decides whether a web origin may talk to the wallet's full
//! provider API. Decisions combine three inputs: the user's privacy-mode
//! preference, a session-scoped cache of approved origins, and the wallet's
//! unlock state.
//!
//! # Components
//!
//! - [`AccessGate`]: pure verdict over privacy mode, cache, and unlock state
//! - [`ApprovalCache`]: origins the user explicitly approved this session
//! - [`RequestRegistry`]: pending [`ProviderRequest`]s keyed by origin
//! - [`Popup`]: the approval surface, opened and closed but never consulted
//! - [`Mediator`]: the state machine that owns the registry and cache
//! - [`actor`]: a mailbox task that serializes every transition
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tollgate_approval::{Command, InboundMessage, Mediator, Origin};
//!
//! let mut mediator = Mediator::builder()
//!     .unlock_state(Arc::new(|| true))
//!     .privacy_mode(Arc::new(|| true))
//!     .build()
//!     .unwrap();
//!
//! let origin = Origin::from("https://dapp.test");
//! let pending = mediator.handle(Command::Inbound(InboundMessage::ProviderRequest {
//!     origin: origin.clone(),
//! }));
//! assert!(pending.is_pending());
//!
//! let granted = mediator.handle(Command::Approve(origin.clone()));
//! assert!(granted.is_granted());
//! assert!(mediator.gate().is_approved(&origin));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod actor;
pub mod cache;
/// Error types and results for the mediator.
pub mod error;
pub mod gate;
pub mod mediator;
pub mod message;
pub mod origin;
pub mod popup;
pub mod registry;
pub mod transport;

pub use actor::{DEFAULT_MAILBOX_CAPACITY, MediatorHandle, forward_inbound, spawn};
pub use cache::ApprovalCache;
pub use error::{ApprovalError, ApprovalResult};
pub use gate::{AccessGate, PrivacyModeSource, UnlockStateSource, Verdict};
pub use mediator::{Command, Mediator, MediatorBuilder, Transition};
pub use message::{InboundMessage, OutboundMessage, Target};
pub use origin::Origin;
pub use popup::{NoPopup, Popup};
pub use registry::{DuplicatePolicy, Enqueued, ProviderRequest, RequestId, RequestRegistry};
pub use transport::{DetachedTransport, NoopNotifier, PublicStateNotifier, Transport};
