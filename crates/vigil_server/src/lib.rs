//! # Vigil Server
//!
//! In-memory reference monitoring server for Vigil.
//!
//! This crate provides:
//! - A fire-and-forget command endpoint (objects appear after a
//!   configurable number of listing requests)
//! - A table endpoint listing sensors, devices, groups and triggers
//! - Parent/kind validation with rejection responses
//! - Hooks for simulating other clients writing concurrently
//!
//! # Architecture
//!
//! The server keeps its object tree in an [`ObjectStore`]. Accepted
//! commands are queued and only applied once enough listings have been
//! served, which is what a client resolving "which object did I just
//! create" has to cope with.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;
mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::{MonitorServer, COMMAND_PATH, TABLE_PATH};
pub use store::{ObjectStore, ROOT_ID};
