//! Demonstration workloads built on the fan-out runner
//!
//! - [`sleep`]: fixed delays, the purest view of overlap
//! - [`fetch`]: HTTP downloads with per-request timeouts
//! - [`pipeline`]: simulated downloads feeding a pooled table transform

pub mod fetch;
pub mod pipeline;
pub mod sleep;
