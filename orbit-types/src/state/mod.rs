pub mod arpeggiator;
pub mod modulation;
pub mod music;
pub mod sequencer;
pub mod session;

pub use arpeggiator::*;
pub use modulation::*;
pub use music::*;
pub use sequencer::*;
pub use session::*;
