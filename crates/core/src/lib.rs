//! `automon-core` -- shared state and control logic for the health monitor.
//!
//! Everything in this crate is synchronous. The daemon crate supplies the
//! execution contexts (periodic timer, deferred worker, interface handlers)
//! and calls into the operations defined here.

pub mod controller;
pub mod error;
pub mod level;
pub mod limits;
pub mod sampler;
pub mod snapshot;
pub mod state;
