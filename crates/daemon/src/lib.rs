//! `automon-daemon` library crate.
//!
//! Execution contexts (periodic sampler, deferred controller worker), the
//! status device and attribute group, the interface host that exposes them,
//! and the load/unload lifecycle tying it together. The binary entrypoint
//! lives in `main.rs`.

pub mod attrs;
pub mod config;
pub mod device;
pub mod error;
pub mod host;
pub mod logbuf;
pub mod module;
pub mod routes;
pub mod timer;
pub mod workqueue;
