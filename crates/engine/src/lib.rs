//! Rulewarden Engine library.
//!
//! Turns a rules question plus live session state into a grounded ruling and
//! a validated set of state changes.
//!
//! ## Structure
//!
//! - `use_cases/` - ruling orchestration and session lifecycle
//! - `infrastructure/` - port traits and adapters (store, model, retrieval)
//! - `stores/` - per-session locks
//! - `app` - composition and the exposed operations

pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

/// End-to-end flows through `App` with scripted model and retrieval fakes.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
pub use infrastructure::settings::EngineSettings;
pub use use_cases::EngineError;
