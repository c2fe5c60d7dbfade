//! Master clock shared by every sequencer.

use orbit_types::{SequencerId, DEFAULT_BPM};

use crate::error::{EngineError, Result};
use crate::rng::Rng;
use crate::sequencer::StepSequencer;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Transport {
    bpm: f64,
    last_tick: f64,
    tick_counter: u64,
    running: bool,
}

/// What one sequencer did on a beat.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub sequencer: SequencerId,
    pub index: usize,
    /// Pitches to sound, if the step fired
    pub notes: Option<Vec<u8>>,
    pub channel: u8,
    pub velocity: u8,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl Transport {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            last_tick: 0.0,
            tick_counter: 0,
            running: false,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        if !bpm.is_finite() || !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            return Err(EngineError::InvalidTempo(bpm));
        }
        self.bpm = bpm;
        Ok(())
    }

    /// Seconds between beats
    pub fn step_interval(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    pub fn last_tick(&self) -> f64 {
        self.last_tick
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reset the counter and start measuring beats from `now`.
    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.last_tick = now;
        self.tick_counter = 0;
        log::info!(target: "transport", "started at {:.1} BPM", self.bpm);
    }

    pub fn stop(&mut self) {
        self.running = false;
        log::info!(target: "transport", "stopped after {} beats", self.tick_counter);
    }

    /// Returns true when a beat is due at `now`, and records it.
    pub fn tick(&mut self, now: f64) -> bool {
        if !self.running {
            return false;
        }
        if now - self.last_tick >= self.step_interval() {
            self.last_tick = now;
            self.tick_counter += 1;
            log::trace!(target: "transport", "beat {}", self.tick_counter);
            true
        } else {
            false
        }
    }
}

/// Advance then trigger every playing sequencer, in registration order.
pub fn advance_all(sequencers: &mut [StepSequencer], rng: &mut Rng) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(sequencers.len());
    for seq in sequencers.iter_mut().filter(|s| s.is_playing()) {
        let index = seq.advance(rng);
        let notes = if seq.should_trigger(rng) {
            Some(seq.current_notes())
        } else {
            None
        };
        outcomes.push(StepOutcome {
            sequencer: seq.id(),
            index,
            notes,
            channel: seq.state().midi_channel,
            velocity: seq.state().velocity,
        });
    }
    outcomes
}
