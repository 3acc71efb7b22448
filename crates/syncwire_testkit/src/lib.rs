//! # Syncwire Testkit
//!
//! Test utilities for syncwire.
//!
//! This crate provides:
//! - Host handler and transport doubles
//! - A two-participant session harness over in-memory transports
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use syncwire_testkit::prelude::*;
//! use syncwire_protocol::Flow;
//!
//! #[test]
//! fn pull_completes() {
//!     let initiator = RecordingHandler::new();
//!     let responder = RecordingHandler::with_stream(vec![b"obj".to_vec()]);
//!     assert!(run_session(Flow::Pull, &initiator, &responder).is_ok());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod session;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::session::*;
}

pub use fixtures::*;
pub use generators::*;
pub use session::*;
