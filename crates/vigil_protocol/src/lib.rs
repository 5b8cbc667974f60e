//! # Vigil Protocol
//!
//! Wire types and JSON codecs for the Vigil monitoring client.
//!
//! This crate provides:
//! - `ObjectRecord` and `ObjectKind` for listed objects
//! - `Scope` for listing filters (container or trigger owner)
//! - `CreateCommand` and its per-kind parameters
//! - Listing and command messages with their encodings
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod error;
mod messages;
mod object;
mod scope;

pub use command::{
    CreateCommand, NewDeviceParameters, NewGroupParameters, NewSensorParameters,
    TriggerParameters, TriggerType,
};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{CommandRequest, CommandResponse, ListRequest, ListResponse};
pub use object::{normalize_name, ObjectId, ObjectKind, ObjectRecord};
pub use scope::Scope;
