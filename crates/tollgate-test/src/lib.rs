//! Tollgate Test - shared test utilities for the approval mediator.
//!
//! Add to a crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! tollgate-test.workspace = true
//! ```
//!
//! Then build a mediator whose collaborators record everything:
//!
//! ```rust,ignore
//! use tollgate_test::MediatorFixture;
//! use tollgate_approval::{Command, InboundMessage};
//!
//! let fixture = MediatorFixture::new();
//! let mut mediator = fixture.mediator();
//! mediator.handle(Command::Inbound(InboundMessage::IsUnlockedQuery));
//! assert_eq!(fixture.transport.actions(), vec!["answer-is-unlocked"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
