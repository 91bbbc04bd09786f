//! Rule enforcement: the validator decides, the transition engine applies.

pub mod transition;
pub mod validator;

pub use transition::{apply, apply_one, Transition};
pub use validator::{validate, StateDelta, Validation, UNRECOGNIZED_ACTION};
