//! Mock collaborators for the mediator.
//!
//! Every mock is cheap to clone and shares its state with its clones, so a
//! test can hand one copy to the mediator and inspect another. Mocks built
//! with `with_log` append to a shared [`EventLog`], which preserves the
//! relative order of popup, transport and notifier calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tollgate_approval::{
    ApprovalError, ApprovalResult, OutboundMessage, Popup, PrivacyModeSource, PublicStateNotifier,
    Target, Transport, UnlockStateSource,
};

/// One observable side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `Popup::open` was called.
    PopupOpened,
    /// `Popup::close` was called.
    PopupClosed,
    /// A message was handed to the transport.
    Sent(OutboundMessage, Target),
    /// Public state was re-published.
    Notified,
}

/// Ordered, shared record of side effects.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Copy of every event so far.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain and return every event so far.
    #[must_use]
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of events matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| predicate(e))
            .count()
    }
}

/// A settable boolean usable as either decision source.
#[derive(Debug, Clone, Default)]
pub struct FlagSource {
    value: Arc<AtomicBool>,
}

impl FlagSource {
    /// Create a flag with an initial value.
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self {
            value: Arc::new(AtomicBool::new(value)),
        }
    }

    /// Change the flag.
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Read the flag.
    #[must_use]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }
}

impl UnlockStateSource for FlagSource {
    fn is_unlocked(&self) -> bool {
        self.get()
    }
}

impl PrivacyModeSource for FlagSource {
    fn privacy_mode(&self) -> bool {
        self.get()
    }
}

/// Popup that records open and close calls.
#[derive(Debug, Clone, Default)]
pub struct CountingPopup {
    log: EventLog,
}

impl CountingPopup {
    /// Create a popup with its own log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a popup that appends to `log`.
    #[must_use]
    pub fn with_log(log: EventLog) -> Self {
        Self { log }
    }

    /// Number of `open` calls.
    #[must_use]
    pub fn opens(&self) -> usize {
        self.log.count(|e| *e == Event::PopupOpened)
    }

    /// Number of `close` calls.
    #[must_use]
    pub fn closes(&self) -> usize {
        self.log.count(|e| *e == Event::PopupClosed)
    }

    /// Whether the most recent call was `open`.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.log
            .events()
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::PopupOpened => Some(true),
                Event::PopupClosed => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl Popup for CountingPopup {
    fn open(&self) {
        self.log.push(Event::PopupOpened);
    }

    fn close(&self) {
        self.log.push(Event::PopupClosed);
    }
}

/// Transport that records every message and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    log: EventLog,
    failing: Arc<AtomicBool>,
}

impl RecordingTransport {
    /// Create a transport with its own log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that appends to `log`.
    #[must_use]
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent send fail (or succeed again).
    ///
    /// Failed sends are not recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every message delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<(OutboundMessage, Target)> {
        self.log
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Sent(message, target) => Some((message, target)),
                _ => None,
            })
            .collect()
    }

    /// Action names of every message delivered so far.
    #[must_use]
    pub fn actions(&self) -> Vec<&'static str> {
        self.sent().iter().map(|(m, _)| m.action()).collect()
    }

    /// The most recent delivery.
    #[must_use]
    pub fn last(&self) -> Option<(OutboundMessage, Target)> {
        self.sent().pop()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, message: OutboundMessage, target: Target) -> ApprovalResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApprovalError::Transport("recording transport set to fail".to_owned()));
        }
        self.log.push(Event::Sent(message, target));
        Ok(())
    }
}

/// Notifier that counts re-publish requests.
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    log: EventLog,
}

impl CountingNotifier {
    /// Create a notifier with its own log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notifier that appends to `log`.
    #[must_use]
    pub fn with_log(log: EventLog) -> Self {
        Self { log }
    }

    /// Number of notifications.
    #[must_use]
    pub fn count(&self) -> usize {
        self.log.count(|e| *e == Event::Notified)
    }
}

impl PublicStateNotifier for CountingNotifier {
    fn notify_changed(&self) {
        self.log.push(Event::Notified);
    }
}
