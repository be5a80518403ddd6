//! Common imports for tests.

pub use crate::fixtures::{MediatorFixture, init_test_tracing, origin};
pub use crate::mocks::{CountingNotifier, CountingPopup, Event, EventLog, FlagSource, RecordingTransport};
