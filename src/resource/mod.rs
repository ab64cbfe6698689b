//! Resource entity model.
//!
//! This module provides the descriptors the registry stores, one family per
//! origin:
//!
//! - [`LocalResource`]: a resource present in local storage, found by the
//!   scanner or recorded by the install pipeline. A tagged enum; map regions
//!   additionally carry the probe result and an advisory [`RemovalLock`].
//! - [`RemoteResource`]: a resource advertised by the repository index,
//!   replaced wholesale on every catalog refresh.
//!
//! Both are keyed by a lowercase `name` and compare by that key alone.
//! Constructors validate their inputs and return [`ResourceError`] on
//! malformed data, so a descriptor that exists is well-formed.

mod error;
mod local;
mod remote;
mod types;

pub use error::ResourceError;
pub use local::{LocalResource, MapFileInfo, RemovalLock};
pub use remote::RemoteResource;
pub use types::ResourceType;
