//! Value objects - immutable, validated-by-construction session values.

mod names;
mod transcript;

pub use names::{GameId, PlayerName};
pub use transcript::{BoundedLog, TranscriptTurn};
