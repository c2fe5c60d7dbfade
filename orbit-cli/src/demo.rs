//! The session the player starts with when no session file is given.

use orbit_core::{Engine, NoteSink};
use orbit_types::{
    ArpAction, ArpDivision, ArpPattern, BindingRecord, ChordType, EngineCommand, EngineFeedback,
    LfoConfig, LfoShape, ModSourceConfig, ModSourceId, Polarity, SequencerAction, SequencerId,
    SteppingMode, TargetKind, TargetRef,
};

/// Parameter the demo LFO drives: the lead sequencer's velocity.
pub const LEAD_VELOCITY: TargetRef = TargetRef::new(0);

const LEAD_VELOCITY_MIN: f64 = 40.0;
const LEAD_VELOCITY_MAX: f64 = 127.0;

/// Two sequencers of different lengths sharing the beat, the second one
/// chorded and arpeggiated, plus a slow LFO on the first one's velocity.
pub fn build(engine: &mut Engine, sink: &mut dyn NoteSink) -> anyhow::Result<()> {
    let lead = engine.add_sequencer()?;
    let bass = engine.add_sequencer()?;

    let commands = [
        EngineCommand::Sequencer(bass, SequencerAction::Rename("bass".to_string())),
        EngineCommand::Sequencer(bass, SequencerAction::SetSlotCount(7)),
        EngineCommand::Sequencer(bass, SequencerAction::SetPulseCount(3)),
        EngineCommand::Sequencer(bass, SequencerAction::SetSteppingMode(SteppingMode::PingPong)),
        EngineCommand::Sequencer(bass, SequencerAction::SetRootNote(48)),
        EngineCommand::Sequencer(bass, SequencerAction::SetOctaveRange(1)),
        EngineCommand::Sequencer(bass, SequencerAction::SetChordEnabled(true)),
        EngineCommand::Sequencer(bass, SequencerAction::SetChordType(ChordType::Minor7)),
        EngineCommand::Arpeggiator(bass, ArpAction::SetEnabled(true)),
        EngineCommand::Arpeggiator(bass, ArpAction::SetPattern(ArpPattern::UpDown)),
        EngineCommand::Arpeggiator(bass, ArpAction::SetDivision(ArpDivision::Eighth)),
        EngineCommand::Sequencer(lead, SequencerAction::Rename("lead".to_string())),
        EngineCommand::AddSource(ModSourceConfig::Lfo(LfoConfig {
            rate: 0.1,
            depth: 80.0,
            shape: LfoShape::Triangle,
        })),
    ];
    let mut source = None;
    for command in commands {
        for feedback in engine.apply(command, 0.0, sink)? {
            if let EngineFeedback::SourceAdded { source: id } = feedback {
                source = Some(id);
            }
        }
    }

    let source = source.unwrap_or(ModSourceId::new(0));
    let original = engine
        .sequencer(lead)
        .map(|s| s.state().velocity as f64)
        .unwrap_or(100.0);
    engine.apply(
        EngineCommand::Bind(BindingRecord {
            source,
            target: LEAD_VELOCITY,
            kind: TargetKind::Continuous {
                min: LEAD_VELOCITY_MIN,
                max: LEAD_VELOCITY_MAX,
            },
            original_value: original,
            polarity: Polarity::Bipolar,
            owner: Some(lead),
        }),
        0.0,
        sink,
    )?;
    log::info!(target: "engine", "demo session ready");
    Ok(())
}

/// Turn a modulated parameter value into the edit that applies it, if it
/// changes anything.
pub fn parameter_command(
    engine: &Engine,
    lead: SequencerId,
    target: TargetRef,
    value: f64,
) -> Option<EngineCommand> {
    if target != LEAD_VELOCITY {
        return None;
    }
    let velocity = value.round().clamp(0.0, 127.0) as u8;
    let current = engine.sequencer(lead)?.state().velocity;
    (current != velocity)
        .then(|| EngineCommand::Sequencer(lead, SequencerAction::SetVelocity(velocity)))
}
