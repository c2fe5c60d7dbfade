//! Error types for the engine

use orbit_types::{ModSourceId, SequencerId};
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by constructors, setters and I/O helpers.
///
/// Nothing inside a tick returns one of these; per-entity failures during a
/// tick are logged and skipped.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("slot count must be at least 1")]
    InvalidSlotCount,

    #[error("MIDI channel {0} out of range (0-15)")]
    InvalidChannel(u8),

    #[error("velocity {0} out of range (0-127)")]
    InvalidVelocity(u8),

    #[error("probability {0} out of range (0-100)")]
    InvalidProbability(u8),

    #[error("pitch {0} out of range (0-127)")]
    InvalidPitch(u8),

    #[error("octave range {0} out of range (1-4)")]
    InvalidOctaveRange(u8),

    #[error("tempo {0} BPM is not usable")]
    InvalidTempo(f64),

    #[error("invalid value range {min}..{max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("discrete target needs at least one option")]
    InvalidOptionCount,

    #[error("{name} = {value} is out of range")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("no sequencer with id {0}")]
    UnknownSequencer(SequencerId),

    #[error("no modulation source with id {0}")]
    UnknownSource(ModSourceId),

    /// An id at the top of the range leaves nothing to hand out next
    #[error("{kind} id {id} is out of range")]
    IdOverflow { kind: &'static str, id: u32 },

    /// Note output backend error
    #[error("output error: {0}")]
    Output(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
