//! # Vigil Testkit
//!
//! Test utilities for Vigil.
//!
//! This crate provides:
//! - An in-process server wired to a real client over loopback HTTP
//! - Scenario helpers that seed servers with known objects
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vigil_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_server() {
//!     with_harness(1, 5, |harness| {
//!         let group = scenarios::probe_group(harness);
//!         // ... create objects under `group`
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
