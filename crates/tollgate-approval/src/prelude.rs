//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tollgate_approval::prelude::*;` to import all essential types.

// Errors
pub use crate::{ApprovalError, ApprovalResult};

// Decision inputs
pub use crate::{AccessGate, ApprovalCache, PrivacyModeSource, UnlockStateSource, Verdict};

// Registry
pub use crate::{DuplicatePolicy, ProviderRequest, RequestId, RequestRegistry};

// Messages
pub use crate::{InboundMessage, Origin, OutboundMessage, Target};

// Collaborators
pub use crate::{Popup, PublicStateNotifier, Transport};

// Mediator
pub use crate::{Command, Mediator, MediatorHandle, Transition};
