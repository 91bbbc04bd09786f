//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod memory_store;
pub mod openai_compat;
pub mod ports;
pub mod resilience;
pub mod settings;
