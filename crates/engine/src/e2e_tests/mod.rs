//! End-to-end flows through a fully composed `App`.
//!
//! Sessions live in the in-memory store; the model and retrieval store are
//! scripted fakes, so these run without any network access.

mod e2e_helpers;
mod session_flow_tests;

pub use e2e_helpers::*;
