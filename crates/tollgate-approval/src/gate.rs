//! Access decision: privacy mode, approval cache, and unlock state.
//!
//! The gate holds no state of its own. A verdict for an origin depends only
//! on the three inputs at the instant it is evaluated:
//!
//! | privacy mode | cached approval | unlocked | verdict |
//! |---|---|---|---|
//! | off | any | yes | [`Verdict::Grant`] |
//! | on | yes | yes | [`Verdict::Grant`] |
//! | on | no | any | [`Verdict::Ask`] |
//! | any | any | no | [`Verdict::Ask`] |

use crate::cache::ApprovalCache;
use crate::origin::Origin;

/// Source of the wallet session's unlock flag.
pub trait UnlockStateSource: Send + Sync {
    /// Whether the wallet is currently unlocked.
    fn is_unlocked(&self) -> bool;
}

/// Source of the user's privacy-mode preference.
pub trait PrivacyModeSource: Send + Sync {
    /// Whether privacy mode is enabled. When disabled, every origin is
    /// implicitly approved.
    fn privacy_mode(&self) -> bool;
}

impl<F> UnlockStateSource for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_unlocked(&self) -> bool {
        self()
    }
}

impl<F> PrivacyModeSource for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn privacy_mode(&self) -> bool {
        self()
    }
}

/// Outcome of evaluating an origin against the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Access may be granted without asking the user.
    Grant,
    /// The user must decide.
    Ask,
}

impl Verdict {
    /// Check if this verdict grants access.
    #[must_use]
    pub fn is_grant(self) -> bool {
        matches!(self, Self::Grant)
    }
}

/// Read-only view combining the three decision inputs.
#[derive(Clone, Copy)]
pub struct AccessGate<'a> {
    privacy: &'a dyn PrivacyModeSource,
    unlock: &'a dyn UnlockStateSource,
    cache: &'a ApprovalCache,
}

impl<'a> AccessGate<'a> {
    /// Build a gate over borrowed inputs.
    #[must_use]
    pub fn new(
        privacy: &'a dyn PrivacyModeSource,
        unlock: &'a dyn UnlockStateSource,
        cache: &'a ApprovalCache,
    ) -> Self {
        Self {
            privacy,
            unlock,
            cache,
        }
    }

    /// Policy-level approval: always true with privacy mode off, otherwise
    /// the cached approval for `origin`.
    #[must_use]
    pub fn is_approved(&self, origin: &Origin) -> bool {
        !self.privacy.privacy_mode() || self.cache.is_approved(origin)
    }

    /// The unlock flag, verbatim.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlock.is_unlocked()
    }

    /// Whether a provider request from `origin` may skip the user.
    #[must_use]
    pub fn verdict(&self, origin: &Origin) -> Verdict {
        if self.is_unlocked() && self.is_approved(origin) {
            Verdict::Grant
        } else {
            Verdict::Ask
        }
    }
}

impl std::fmt::Debug for AccessGate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("privacy_mode", &self.privacy.privacy_mode())
            .field("unlocked", &self.unlock.is_unlocked())
            .field("cache", self.cache)
            .finish()
    }
}
