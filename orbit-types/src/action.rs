//! Commands accepted by the engine.
//!
//! Every user edit is expressed as an [`EngineCommand`] so the driver can
//! either apply it immediately or queue it for the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::{
    ArpDivision, ArpPattern, BindingRecord, ChordType, ModSourceConfig, ModSourceId, Scale,
    SequencerId, SteppingMode, TargetRef,
};

/// Per-sequencer parameter edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SequencerAction {
    SetSlotCount(usize),
    SetPulseCount(usize),
    SetRotation(usize),
    SetSteppingMode(SteppingMode),
    SetPlaying(bool),
    TogglePlaying,
    SetBrownianRange(usize),
    SetProbability(u8),
    SetVelocity(u8),
    SetMidiChannel(u8),
    SetChordEnabled(bool),
    SetChordType(ChordType),
    SetRootNote(u8),
    SetScale(Scale),
    SetOctaveRange(u8),
    Rename(String),
    /// Playhead back to 0, direction forward
    Reset,
}

/// Per-sequencer arpeggiator edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArpAction {
    SetEnabled(bool),
    Toggle,
    SetPattern(ArpPattern),
    CyclePattern,
    SetDivision(ArpDivision),
    SetGateLength(f64),
    SetOctaveRange(u8),
    SetVelocity(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineCommand {
    AddSequencer,
    RemoveSequencer(SequencerId),
    Sequencer(SequencerId, SequencerAction),
    Arpeggiator(SequencerId, ArpAction),
    AddSource(ModSourceConfig),
    RemoveSource(ModSourceId),
    ConfigureSource(ModSourceId, ModSourceConfig),
    Bind(BindingRecord),
    Unbind(TargetRef),
    TriggerEnvelope(ModSourceId),
    ReleaseEnvelope(ModSourceId),
    SetTempo(f64),
    Start,
    Stop,
}

impl EngineCommand {
    /// Commands that change which entities exist. Used for logging at info.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EngineCommand::AddSequencer
                | EngineCommand::RemoveSequencer(_)
                | EngineCommand::AddSource(_)
                | EngineCommand::RemoveSource(_)
        )
    }
}

/// Notifications produced by a tick or an applied command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineFeedback {
    /// A sequencer's playhead moved
    StepAdvanced { sequencer: SequencerId, index: usize },
    /// Notes went out because a step fired
    NoteTriggered { sequencer: SequencerId, notes: Vec<u8> },
    /// A modulated parameter has a new value to apply
    ParameterChanged { target: TargetRef, value: f64 },
    SequencerAdded { sequencer: SequencerId },
    SequencerRemoved { sequencer: SequencerId },
    SourceAdded { source: ModSourceId },
    SourceRemoved { source: ModSourceId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LfoConfig;

    #[test]
    fn structural_commands() {
        assert!(EngineCommand::AddSequencer.is_structural());
        assert!(EngineCommand::AddSource(ModSourceConfig::Lfo(LfoConfig::default())).is_structural());
        assert!(!EngineCommand::SetTempo(90.0).is_structural());
        assert!(!EngineCommand::Sequencer(SequencerId::new(0), SequencerAction::Reset).is_structural());
    }

    #[test]
    fn command_serializes() {
        let cmd = EngineCommand::Sequencer(SequencerId::new(2), SequencerAction::SetPulseCount(5));
        let json = serde_json::to_string(&cmd).unwrap();
        let back: EngineCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
