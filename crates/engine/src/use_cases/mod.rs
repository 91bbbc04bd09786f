//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area. Mutating use cases
//! enter the session gate, load a snapshot, and persist through `commit`.

mod commit;
pub mod error;
pub mod gate;
pub mod ruling;
pub mod session;

pub use error::EngineError;
pub use gate::SessionGate;
pub use ruling::RulingUseCases;
pub use session::SessionUseCases;
