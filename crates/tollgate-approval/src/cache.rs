//! Session-scoped record of explicitly approved origins.

use std::collections::HashMap;
use std::fmt;

use crate::origin::Origin;

/// Origins the user has explicitly granted provider access.
///
/// The cache lives only as long as the process. It is owned by the
/// [`Mediator`](crate::Mediator) and is never shared, so it needs no internal
/// locking. Revocation is all-or-nothing via [`clear`](Self::clear).
///
/// # Example
///
/// ```
/// use tollgate_approval::{ApprovalCache, Origin};
///
/// let mut cache = ApprovalCache::new();
/// let origin = Origin::from("https://dapp.test");
/// cache.approve(origin.clone());
/// assert!(cache.is_approved(&origin));
///
/// cache.clear();
/// assert!(!cache.is_approved(&origin));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApprovalCache {
    approved: HashMap<Origin, bool>,
}

impl ApprovalCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an origin as approved. Approving twice is the same as once.
    pub fn approve(&mut self, origin: Origin) {
        self.approved.insert(origin, true);
    }

    /// Raw lookup of the stored approval. Absent origins are not approved.
    ///
    /// This ignores privacy mode; use [`AccessGate`](crate::AccessGate) for
    /// the policy-level answer.
    #[must_use]
    pub fn is_approved(&self, origin: &Origin) -> bool {
        self.approved.get(origin).copied().unwrap_or(false)
    }

    /// Forget every approval.
    pub fn clear(&mut self) {
        self.approved.clear();
    }

    /// Number of approved origins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.approved.values().filter(|approved| **approved).count()
    }

    /// Whether no origin is approved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ApprovalCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalCache")
            .field("count", &self.len())
            .finish()
    }
}
