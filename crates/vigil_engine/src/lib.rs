//! # Vigil Engine
//!
//! Client for monitoring servers whose creation commands do not return
//! the id of the object they create.
//!
//! This crate provides:
//! - Snapshots of a container or owner scope
//! - Before/after differencing by object id
//! - Disambiguation of singular and plural creations
//! - Bounded, cancellable retry with blocking and async drivers
//! - The resolver that ties them together, and a typed client on top
//! - HTTP transport abstraction
//!
//! ## Architecture
//!
//! Every `create_*` call follows the same sequence:
//! 1. List the target scope ("before")
//! 2. Send the creation command
//! 3. List again ("after") until new ids appear or attempts run out
//! 4. Return the new object(s), or fail as ambiguous or timed out
//!
//! ## Key Invariants
//!
//! - Identity is the object id; names are never used to match
//! - Several new objects where one was expected is an error, never a guess
//! - Ambiguity, timeout and cancellation are distinct errors
//! - Skipping resolution lists nothing

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod client;
mod config;
mod diff;
mod disambiguate;
mod error;
mod http;
mod request;
mod resolver;
mod retry;
mod snapshot;
mod transport;

pub use cancel::CancellationToken;
pub use client::MonitorClient;
pub use config::{ClientConfig, RetryConfig};
pub use diff::diff;
pub use disambiguate::{select, Selection};
pub use error::{CandidateSummary, ClientError, ClientResult, ResolutionError};
pub use http::{HttpClient, HttpTransport, LoopbackClient, LoopbackServer};
pub use request::{Cardinality, KindDescriptor, ResolutionOutcome, ResolutionRequest, ScopeKind};
pub use resolver::{Resolution, Resolver, ResolverStats};
pub use retry::{RetryReport, RetryScheduler};
pub use snapshot::{Snapshot, SnapshotProvider};
pub use transport::{MockTransport, MonitorTransport};
