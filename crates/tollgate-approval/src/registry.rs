//! Pending provider-access requests, keyed by origin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::origin::Origin;

/// Unique identifier for a provider request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// One outstanding ask for full provider access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Request identifier, stable for the life of the entry.
    pub id: RequestId,
    /// The origin asking for access.
    pub origin: Origin,
    /// When the request was received.
    pub received_at: DateTime<Utc>,
}

impl ProviderRequest {
    /// Create a request for `origin` stamped with the current time.
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        Self {
            id: RequestId::new(),
            origin,
            received_at: Utc::now(),
        }
    }
}

/// How a second request from an origin that is already pending is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep one entry per origin: the new request supersedes the old one and
    /// moves to the back of the queue.
    #[default]
    Replace,
    /// Keep every request. Resolving the origin still resolves all of them.
    Queue,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Queue => f.write_str("queue"),
        }
    }
}

/// Result of [`RequestRegistry::enqueue`].
#[derive(Debug, Clone)]
pub struct Enqueued {
    /// The newly recorded request.
    pub request: ProviderRequest,
    /// Entries for the same origin dropped under [`DuplicatePolicy::Replace`].
    pub superseded: usize,
}

/// Ordered record of pending provider requests.
///
/// Entries are only ever inserted or removed, never edited. Every change
/// bumps [`revision`](Self::revision) so observers can tell when a fresh
/// snapshot is due.
#[derive(Debug, Clone, Default)]
pub struct RequestRegistry {
    requests: Vec<ProviderRequest>,
    policy: DuplicatePolicy,
    revision: u64,
}

impl RequestRegistry {
    /// Create an empty registry with the default duplicate policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with an explicit duplicate policy.
    #[must_use]
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The duplicate policy in effect.
    #[must_use]
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Record a new request for `origin`.
    pub fn enqueue(&mut self, origin: Origin) -> Enqueued {
        let superseded = match self.policy {
            DuplicatePolicy::Replace => self.retain_other_origins(&origin),
            DuplicatePolicy::Queue => 0,
        };
        let request = ProviderRequest::new(origin);
        self.requests.push(request.clone());
        self.bump();
        Enqueued {
            request,
            superseded,
        }
    }

    /// Remove every entry for `origin`, returning how many were removed.
    ///
    /// Removing an origin with no entries is not an error.
    pub fn remove_by_origin(&mut self, origin: &Origin) -> usize {
        let removed = self.retain_other_origins(origin);
        if removed > 0 {
            self.bump();
        }
        removed
    }

    /// Copy of the pending requests, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ProviderRequest> {
        self.requests.clone()
    }

    /// Whether `origin` has at least one pending entry.
    #[must_use]
    pub fn contains(&self, origin: &Origin) -> bool {
        self.requests.iter().any(|r| &r.origin == origin)
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Monotonic change counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn retain_other_origins(&mut self, origin: &Origin) -> usize {
        let before = self.requests.len();
        self.requests.retain(|r| &r.origin != origin);
        before.saturating_sub(self.requests.len())
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
