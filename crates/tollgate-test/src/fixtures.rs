//! Ready-made mediators and common values.

use std::sync::{Arc, Once};

use tokio::task::JoinHandle;
use tollgate_approval::{
    DuplicatePolicy, Mediator, MediatorHandle, Origin, Popup, PrivacyModeSource,
    PublicStateNotifier, Transport, UnlockStateSource, spawn,
};

use crate::mocks::{CountingNotifier, CountingPopup, EventLog, FlagSource, RecordingTransport};

/// Build an [`Origin`] from a host name, e.g. `origin("a")` is
/// `https://a.test`.
#[must_use]
pub fn origin(host: &str) -> Origin {
    Origin::new(format!("https://{host}.test"))
}

/// Install a test-writer tracing subscriber once per process.
///
/// Honors `RUST_LOG`; silent by default.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A full set of recording collaborators sharing one [`EventLog`].
///
/// Defaults to an unlocked wallet with privacy mode on, the state in which
/// every provider request needs the user.
#[derive(Debug, Clone)]
pub struct MediatorFixture {
    /// Unlock flag handed to the mediator.
    pub unlocked: FlagSource,
    /// Privacy-mode flag handed to the mediator.
    pub privacy: FlagSource,
    /// Recording popup.
    pub popup: CountingPopup,
    /// Recording transport.
    pub transport: RecordingTransport,
    /// Counting notifier.
    pub notifier: CountingNotifier,
    /// Ordered record of every side effect above.
    pub log: EventLog,
    policy: DuplicatePolicy,
}

impl Default for MediatorFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl MediatorFixture {
    /// Unlocked, privacy mode on, replace-duplicates policy.
    #[must_use]
    pub fn new() -> Self {
        let log = EventLog::new();
        Self {
            unlocked: FlagSource::new(true),
            privacy: FlagSource::new(true),
            popup: CountingPopup::with_log(log.clone()),
            transport: RecordingTransport::with_log(log.clone()),
            notifier: CountingNotifier::with_log(log.clone()),
            log,
            policy: DuplicatePolicy::Replace,
        }
    }

    /// Start from a locked wallet.
    #[must_use]
    pub fn locked(self) -> Self {
        self.unlocked.set(false);
        self
    }

    /// Start with privacy mode off.
    #[must_use]
    pub fn without_privacy(self) -> Self {
        self.privacy.set(false);
        self
    }

    /// Use `policy` for duplicate requests.
    #[must_use]
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a mediator wired to this fixture's collaborators.
    ///
    /// # Panics
    ///
    /// Never in practice: both required sources are always supplied.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn mediator(&self) -> Mediator {
        Mediator::builder()
            .unlock_state(Arc::new(self.unlocked.clone()) as Arc<dyn UnlockStateSource>)
            .privacy_mode(Arc::new(self.privacy.clone()) as Arc<dyn PrivacyModeSource>)
            .popup(Arc::new(self.popup.clone()) as Arc<dyn Popup>)
            .transport(Arc::new(self.transport.clone()) as Arc<dyn Transport>)
            .notifier(Arc::new(self.notifier.clone()) as Arc<dyn PublicStateNotifier>)
            .duplicate_policy(self.policy)
            .build()
            .expect("fixture supplies every required collaborator")
    }

    /// Build a mediator and spawn it on the current runtime.
    #[must_use]
    pub fn spawn(&self) -> (MediatorHandle, JoinHandle<()>) {
        spawn(self.mediator(), tollgate_approval::DEFAULT_MAILBOX_CAPACITY)
    }
}
