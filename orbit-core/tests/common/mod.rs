#![allow(dead_code)]
//! Test harness utilities for orbit-core integration tests.

use std::collections::HashMap;

use orbit_core::{Engine, NoteSink, Result};
use orbit_types::{EngineFeedback, SequencerId, SequencerState, SteppingMode};

pub const FRAME_RATE: f64 = 120.0;

/// A note event seen by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    On { channel: u8, pitch: u8, velocity: u8 },
    Off { channel: u8, pitch: u8 },
}

/// Records every note event in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<NoteEvent>,
}

impl RecordingSink {
    pub fn note_ons(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, NoteEvent::On { .. }))
            .count()
    }

    pub fn note_offs(&self) -> usize {
        self.events.len() - self.note_ons()
    }

    /// Notes that were switched on and never off.
    pub fn hanging(&self) -> Vec<(u8, u8)> {
        let mut balance: HashMap<(u8, u8), i64> = HashMap::new();
        for event in &self.events {
            match *event {
                NoteEvent::On { channel, pitch, .. } => {
                    *balance.entry((channel, pitch)).or_default() += 1
                }
                NoteEvent::Off { channel, pitch } => {
                    *balance.entry((channel, pitch)).or_default() -= 1
                }
            }
        }
        let mut hanging: Vec<(u8, u8)> = balance
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(key, _)| key)
            .collect();
        hanging.sort();
        hanging
    }
}

impl NoteSink for RecordingSink {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<()> {
        self.events.push(NoteEvent::On { channel, pitch, velocity });
        Ok(())
    }

    fn note_off(&mut self, channel: u8, pitch: u8) -> Result<()> {
        self.events.push(NoteEvent::Off { channel, pitch });
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Frame clock. Times are computed from the frame number so they never drift.
#[derive(Debug, Default)]
pub struct Clock {
    pub frame: u64,
}

impl Clock {
    pub fn now(&self) -> f64 {
        self.frame as f64 / FRAME_RATE
    }

    pub fn advance(&mut self) -> f64 {
        self.frame += 1;
        self.now()
    }
}

/// Run `frames` frames, collecting all feedback.
pub fn run(
    engine: &mut Engine,
    clock: &mut Clock,
    sink: &mut RecordingSink,
    frames: u64,
) -> Vec<EngineFeedback> {
    let mut feedback = Vec::new();
    for _ in 0..frames {
        let now = clock.advance();
        feedback.extend(engine.tick(now, sink));
    }
    feedback
}

/// A sequencer where every slot fires.
pub fn dense_state(slots: usize, mode: SteppingMode) -> SequencerState {
    let mut state = SequencerState::new(SequencerId::new(0));
    state.slot_count = slots;
    state.pulse_count = slots;
    state.stepping_mode = mode;
    state
}

/// Every index a sequencer stepped to, in order.
pub fn steps_of(feedback: &[EngineFeedback], id: SequencerId) -> Vec<usize> {
    feedback
        .iter()
        .filter_map(|f| match f {
            EngineFeedback::StepAdvanced { sequencer, index } if *sequencer == id => Some(*index),
            _ => None,
        })
        .collect()
}
