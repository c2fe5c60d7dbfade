//! One independent step sequencer: pattern, pitch table and playhead.

use orbit_types::{ChordType, Scale, SequencerAction, SequencerId, SequencerState, SteppingMode};

use crate::error::{EngineError, Result};
use crate::rhythm;
use crate::rng::Rng;
use crate::scale;

pub const MAX_OCTAVE_RANGE: u8 = 4;

const FIBONACCI: [usize; 8] = [0, 1, 1, 2, 3, 5, 8, 13];
/// Chance that a random walk keeps its current heading
const WALK_PERSISTENCE: f64 = 0.7;

/// Mode-local memory that survives between advances.
#[derive(Debug, Clone, Default, PartialEq)]
struct StepMemory {
    pendulum_count: usize,
}

#[derive(Debug, Clone)]
pub struct StepSequencer {
    state: SequencerState,
    pattern: Vec<bool>,
    pitches: Vec<u8>,
    memory: StepMemory,
}

impl StepSequencer {
    /// Validate a state record and build its pattern and pitch table.
    pub fn new(state: SequencerState) -> Result<Self> {
        validate(&state)?;
        let mut seq = Self {
            state,
            pattern: Vec::new(),
            pitches: Vec::new(),
            memory: StepMemory::default(),
        };
        seq.regenerate_pattern();
        seq.regenerate_pitches();
        Ok(seq)
    }

    pub fn id(&self) -> SequencerId {
        self.state.id
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn pattern(&self) -> &[bool] {
        &self.pattern
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    /// Move the playhead one step according to the stepping mode.
    ///
    /// No-op while stopped. Returns the (possibly unchanged) playhead.
    pub fn advance(&mut self, rng: &mut Rng) -> usize {
        if !self.state.playing {
            return self.state.current_index;
        }
        let slots = self.pattern.len();
        if slots == 0 {
            log::warn!(target: "sequencer", "sequencer {} has an empty pattern, not advancing", self.state.id);
            return self.state.current_index;
        }
        let next = next_index(
            self.state.stepping_mode,
            self.state.current_index,
            slots,
            self.state.brownian_range,
            &mut self.state.direction,
            &mut self.memory,
            rng,
        );
        self.state.current_index = next;
        log::trace!(target: "sequencer", "sequencer {} -> step {}", self.state.id, next);
        next
    }

    /// True when the current slot is a pulse and the probability roll passes.
    pub fn should_trigger(&self, rng: &mut Rng) -> bool {
        let on = self
            .pattern
            .get(self.state.current_index)
            .copied()
            .unwrap_or(false);
        if !on {
            return false;
        }
        (rng.next_f64() * 100.0) < self.state.probability as f64
    }

    /// Pitches to play for the current step: the mapped pitch, or its chord.
    pub fn current_notes(&self) -> Vec<u8> {
        let pitch = self
            .pitches
            .get(self.state.current_index)
            .copied()
            .unwrap_or(self.state.root_note);
        if self.state.chord_enabled {
            self.state.chord_type.expand(pitch)
        } else {
            vec![pitch]
        }
    }

    /// Playhead to 0, heading forward, mode-local memory cleared.
    pub fn reset(&mut self) {
        self.state.current_index = 0;
        self.state.direction = 1;
        self.memory = StepMemory::default();
    }

    /// Changing the slot count leaves the playhead where it is; `advance` and
    /// `should_trigger` tolerate an index past the end.
    pub fn set_slot_count(&mut self, slots: usize) -> Result<()> {
        if slots == 0 {
            return Err(EngineError::InvalidSlotCount);
        }
        self.state.slot_count = slots;
        self.regenerate_pattern();
        self.regenerate_pitches();
        Ok(())
    }

    /// Pulse counts above the slot count are clamped by the generator.
    pub fn set_pulse_count(&mut self, pulses: usize) {
        self.state.pulse_count = pulses;
        self.regenerate_pattern();
    }

    pub fn set_rotation(&mut self, rotation: usize) {
        self.state.rotation = rotation;
        self.regenerate_pattern();
    }

    /// A new mode starts heading forward with fresh mode-local memory.
    pub fn set_stepping_mode(&mut self, mode: SteppingMode) {
        if self.state.stepping_mode != mode {
            self.state.direction = 1;
            self.memory = StepMemory::default();
        }
        self.state.stepping_mode = mode;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.playing = playing;
    }

    pub fn set_brownian_range(&mut self, range: usize) {
        self.state.brownian_range = range;
    }

    pub fn set_probability(&mut self, probability: u8) -> Result<()> {
        if probability > 100 {
            return Err(EngineError::InvalidProbability(probability));
        }
        self.state.probability = probability;
        Ok(())
    }

    pub fn set_velocity(&mut self, velocity: u8) -> Result<()> {
        if velocity > 127 {
            return Err(EngineError::InvalidVelocity(velocity));
        }
        self.state.velocity = velocity;
        Ok(())
    }

    pub fn set_midi_channel(&mut self, channel: u8) -> Result<()> {
        if channel > 15 {
            return Err(EngineError::InvalidChannel(channel));
        }
        self.state.midi_channel = channel;
        Ok(())
    }

    pub fn set_chord_enabled(&mut self, enabled: bool) {
        self.state.chord_enabled = enabled;
    }

    pub fn set_chord_type(&mut self, chord: ChordType) {
        self.state.chord_type = chord;
    }

    pub fn set_root_note(&mut self, root: u8) -> Result<()> {
        if root > 127 {
            return Err(EngineError::InvalidPitch(root));
        }
        self.state.root_note = root;
        self.regenerate_pitches();
        Ok(())
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.state.scale = scale;
        self.regenerate_pitches();
    }

    pub fn set_octave_range(&mut self, range: u8) -> Result<()> {
        if !(1..=MAX_OCTAVE_RANGE).contains(&range) {
            return Err(EngineError::InvalidOctaveRange(range));
        }
        self.state.octave_range = range;
        self.regenerate_pitches();
        Ok(())
    }

    pub fn apply(&mut self, action: &SequencerAction) -> Result<()> {
        match action {
            SequencerAction::SetSlotCount(n) => self.set_slot_count(*n)?,
            SequencerAction::SetPulseCount(n) => self.set_pulse_count(*n),
            SequencerAction::SetRotation(n) => self.set_rotation(*n),
            SequencerAction::SetSteppingMode(mode) => self.set_stepping_mode(*mode),
            SequencerAction::SetPlaying(playing) => self.set_playing(*playing),
            SequencerAction::TogglePlaying => self.set_playing(!self.state.playing),
            SequencerAction::SetBrownianRange(r) => self.set_brownian_range(*r),
            SequencerAction::SetProbability(p) => self.set_probability(*p)?,
            SequencerAction::SetVelocity(v) => self.set_velocity(*v)?,
            SequencerAction::SetMidiChannel(ch) => self.set_midi_channel(*ch)?,
            SequencerAction::SetChordEnabled(on) => self.set_chord_enabled(*on),
            SequencerAction::SetChordType(chord) => self.set_chord_type(*chord),
            SequencerAction::SetRootNote(root) => self.set_root_note(*root)?,
            SequencerAction::SetScale(scale) => self.set_scale(*scale),
            SequencerAction::SetOctaveRange(r) => self.set_octave_range(*r)?,
            SequencerAction::Rename(name) => self.state.name = name.clone(),
            SequencerAction::Reset => self.reset(),
        }
        Ok(())
    }

    fn regenerate_pattern(&mut self) {
        self.pattern = rhythm::generate_rotated(
            self.state.pulse_count,
            self.state.slot_count,
            self.state.rotation,
        );
    }

    fn regenerate_pitches(&mut self) {
        self.pitches = scale::generate(
            self.state.slot_count,
            self.state.root_note,
            self.state.scale,
            self.state.octave_range,
        );
    }
}

fn validate(state: &SequencerState) -> Result<()> {
    if state.slot_count == 0 {
        return Err(EngineError::InvalidSlotCount);
    }
    if state.midi_channel > 15 {
        return Err(EngineError::InvalidChannel(state.midi_channel));
    }
    if state.velocity > 127 {
        return Err(EngineError::InvalidVelocity(state.velocity));
    }
    if state.probability > 100 {
        return Err(EngineError::InvalidProbability(state.probability));
    }
    if state.root_note > 127 {
        return Err(EngineError::InvalidPitch(state.root_note));
    }
    if !(1..=MAX_OCTAVE_RANGE).contains(&state.octave_range) {
        return Err(EngineError::InvalidOctaveRange(state.octave_range));
    }
    Ok(())
}

/// Next playhead position. `slots` must be non-zero.
fn next_index(
    mode: SteppingMode,
    current: usize,
    slots: usize,
    brownian_range: usize,
    direction: &mut i8,
    memory: &mut StepMemory,
    rng: &mut Rng,
) -> usize {
    let c = current.min(slots - 1);
    let n = slots as i64;
    match mode {
        SteppingMode::Forward => (c + 1) % slots,
        SteppingMode::Backward => (c + slots - 1) % slots,
        SteppingMode::PingPong => {
            if slots == 1 {
                return 0;
            }
            if c == slots - 1 {
                *direction = -1;
            } else if c == 0 {
                *direction = 1;
            } else if *direction >= 0 {
                *direction = 1;
            } else {
                *direction = -1;
            }
            (c as i64 + *direction as i64) as usize
        }
        SteppingMode::Random => rng.below(slots),
        SteppingMode::Brownian => {
            let range = brownian_range.min(slots - 1);
            (c as i64 + rng.offset(range)).rem_euclid(n) as usize
        }
        SteppingMode::Spiral => ((c / 4) * 4 + ((c % 4) + 1) % 4) % slots,
        SteppingMode::Pendulum => {
            let third = slots / 3;
            let phase = (memory.pendulum_count / 3) % 3;
            memory.pendulum_count = memory.pendulum_count.wrapping_add(1);
            third * phase
        }
        SteppingMode::SkipTwo => (c + 3) % slots,
        SteppingMode::Fibonacci => (c + FIBONACCI[(c + 1) % FIBONACCI.len()]) % slots,
        SteppingMode::RandomWalk => {
            let heading: i8 = if *direction >= 0 { 1 } else { -1 };
            *direction = if rng.chance(WALK_PERSISTENCE) { heading } else { -heading };
            (c as i64 + *direction as i64).rem_euclid(n) as usize
        }
    }
}
