//! Wire contract between page contexts and the mediator.
//!
//! Messages are JSON objects tagged by an `action` field. Inbound messages
//! come from untrusted pages, so decoding is lenient in one direction only:
//! anything that is not one of the four known shapes is dropped without a
//! reply. User decisions are deliberately absent from [`InboundMessage`];
//! they travel on the trusted [`Command`](crate::Command) path.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ApprovalError, ApprovalResult};
use crate::origin::Origin;

/// A message from a page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// Ask for full provider access.
    #[serde(alias = "init-provider-request")]
    ProviderRequest {
        /// Requesting origin.
        origin: Origin,
    },
    /// Ask whether `origin` is approved under the current policy.
    #[serde(alias = "init-is-approved")]
    IsApprovedQuery {
        /// Origin being asked about.
        origin: Origin,
    },
    /// Ask whether the wallet is unlocked.
    #[serde(alias = "init-is-unlocked")]
    IsUnlockedQuery,
    /// Ask whether access is granted by policy alone (privacy mode off).
    #[serde(alias = "init-privacy-request")]
    PrivacyStatusQuery,
}

impl InboundMessage {
    /// Decode a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Malformed`] for a missing or unknown `action`
    /// or a missing field.
    pub fn decode(value: serde_json::Value) -> ApprovalResult<Self> {
        serde_json::from_value(value).map_err(|e| ApprovalError::Malformed(e.to_string()))
    }

    /// Decode a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Malformed`] if the text is not JSON or not a
    /// known message.
    pub fn decode_str(text: &str) -> ApprovalResult<Self> {
        serde_json::from_str(text).map_err(|e| ApprovalError::Malformed(e.to_string()))
    }

    /// The wire `action` name.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::ProviderRequest { .. } => "provider-request",
            Self::IsApprovedQuery { .. } => "is-approved-query",
            Self::IsUnlockedQuery => "is-unlocked-query",
            Self::PrivacyStatusQuery => "privacy-status-query",
        }
    }

    /// The origin carried by the message, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Self::ProviderRequest { origin } | Self::IsApprovedQuery { origin } => Some(origin),
            Self::IsUnlockedQuery | Self::PrivacyStatusQuery => None,
        }
    }
}

/// A message from the mediator to page contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Reply to [`InboundMessage::IsApprovedQuery`].
    AnswerIsApproved {
        /// Policy-level approval for the queried origin.
        #[serde(rename = "isApproved")]
        is_approved: bool,
    },
    /// Reply to [`InboundMessage::IsUnlockedQuery`].
    AnswerIsUnlocked {
        /// Current unlock flag.
        #[serde(rename = "isUnlocked")]
        is_unlocked: bool,
    },
    /// The requesting context may now use the full provider.
    ProviderApproved,
    /// The requesting context's request was denied.
    ProviderRejected,
    /// The wallet session locked.
    WalletLocked,
}

impl OutboundMessage {
    /// The wire `action` name.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::AnswerIsApproved { .. } => "answer-is-approved",
            Self::AnswerIsUnlocked { .. } => "answer-is-unlocked",
            Self::ProviderApproved => "provider-approved",
            Self::ProviderRejected => "provider-rejected",
            Self::WalletLocked => "wallet-locked",
        }
    }
}

/// Which contexts an outbound message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// The active requesting context.
    Active,
    /// Every connected context.
    All,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::All => f.write_str("all"),
        }
    }
}
