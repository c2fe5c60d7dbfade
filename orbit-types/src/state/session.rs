//! Whole-session snapshot.

use serde::{Deserialize, Serialize};

use super::arpeggiator::ArpeggiatorConfig;
use super::modulation::{BindingRecord, ModSourceRecord};
use super::sequencer::SequencerState;
use crate::SequencerId;

pub const DEFAULT_BPM: f64 = 120.0;

/// Arpeggiator settings attached to one sequencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArpeggiatorRecord {
    pub sequencer: SequencerId,
    pub config: ArpeggiatorConfig,
}

/// Everything needed to rebuild an engine. Sequencers are kept in
/// registration order, which is also their stepping order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub bpm: f64,
    pub sequencers: Vec<SequencerState>,
    #[serde(default)]
    pub arpeggiators: Vec<ArpeggiatorRecord>,
    #[serde(default)]
    pub sources: Vec<ModSourceRecord>,
    #[serde(default)]
    pub bindings: Vec<BindingRecord>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            sequencers: Vec::new(),
            arpeggiators: Vec::new(),
            sources: Vec::new(),
            bindings: Vec::new(),
        }
    }
}
