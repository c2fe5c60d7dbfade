//! LFOs, envelopes and the patch table that routes them onto parameters.

pub mod envelope;
pub mod lfo;
pub mod router;

pub use envelope::{EnvStage, Envelope};
pub use lfo::Lfo;
pub use router::{ModSource, ModulationRouter};
