//! Step sequencer records.

use serde::{Deserialize, Serialize};

use super::music::{ChordType, Scale};
use crate::SequencerId;

pub const DEFAULT_SLOTS: usize = 16;
pub const DEFAULT_PULSES: usize = 16;
pub const DEFAULT_ROOT_NOTE: u8 = 60;
pub const DEFAULT_OCTAVE_RANGE: u8 = 2;
pub const DEFAULT_VELOCITY: u8 = 100;
pub const DEFAULT_PROBABILITY: u8 = 100;

/// Playhead stepping policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteppingMode {
    Forward,
    Backward,
    PingPong,
    Random,
    Brownian,
    Spiral,
    Pendulum,
    SkipTwo,
    Fibonacci,
    RandomWalk,
}

impl SteppingMode {
    pub const ALL: [SteppingMode; 10] = [
        SteppingMode::Forward,
        SteppingMode::Backward,
        SteppingMode::PingPong,
        SteppingMode::Random,
        SteppingMode::Brownian,
        SteppingMode::Spiral,
        SteppingMode::Pendulum,
        SteppingMode::SkipTwo,
        SteppingMode::Fibonacci,
        SteppingMode::RandomWalk,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SteppingMode::Forward => "Forward",
            SteppingMode::Backward => "Backward",
            SteppingMode::PingPong => "Ping-Pong",
            SteppingMode::Random => "Random",
            SteppingMode::Brownian => "Brownian",
            SteppingMode::Spiral => "Spiral",
            SteppingMode::Pendulum => "Pendulum",
            SteppingMode::SkipTwo => "Skip Two",
            SteppingMode::Fibonacci => "Fibonacci",
            SteppingMode::RandomWalk => "Random Walk",
        }
    }

    pub fn from_name(name: &str) -> Option<SteppingMode> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "forward" => Some(SteppingMode::Forward),
            "backward" => Some(SteppingMode::Backward),
            "pingpong" => Some(SteppingMode::PingPong),
            "random" => Some(SteppingMode::Random),
            "brownian" => Some(SteppingMode::Brownian),
            "spiral" => Some(SteppingMode::Spiral),
            "pendulum" => Some(SteppingMode::Pendulum),
            "skiptwo" => Some(SteppingMode::SkipTwo),
            "fibonacci" => Some(SteppingMode::Fibonacci),
            "randomwalk" => Some(SteppingMode::RandomWalk),
            _ => None,
        }
    }

    pub fn next(&self) -> SteppingMode {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> SteppingMode {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Everything that describes one sequencer, including its playhead.
///
/// Only primitive fields, so the record can be persisted and restored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerState {
    pub id: SequencerId,
    pub name: String,
    pub slot_count: usize,
    pub pulse_count: usize,
    /// Rotates the Euclidean pattern to the right by this many slots
    #[serde(default)]
    pub rotation: usize,
    pub current_index: usize,
    /// +1 or -1; used by ping-pong and random walk
    pub direction: i8,
    pub stepping_mode: SteppingMode,
    pub playing: bool,
    pub brownian_range: usize,
    /// 0-100, chance a pulse actually sounds
    pub probability: u8,
    /// 0-127
    pub velocity: u8,
    /// 0-15
    pub midi_channel: u8,
    pub chord_enabled: bool,
    pub chord_type: ChordType,
    pub root_note: u8,
    pub scale: Scale,
    /// Number of octaves the pitch table climbs through (>= 1)
    pub octave_range: u8,
}

impl SequencerState {
    pub fn new(id: SequencerId) -> Self {
        Self {
            id,
            name: format!("Sequencer {}", id.get()),
            slot_count: DEFAULT_SLOTS,
            pulse_count: DEFAULT_PULSES,
            rotation: 0,
            current_index: 0,
            direction: 1,
            stepping_mode: SteppingMode::Forward,
            playing: true,
            brownian_range: 1,
            probability: DEFAULT_PROBABILITY,
            velocity: DEFAULT_VELOCITY,
            midi_channel: (id.get() % 16) as u8,
            chord_enabled: false,
            chord_type: ChordType::Major,
            root_note: DEFAULT_ROOT_NOTE,
            scale: Scale::Minor,
            octave_range: DEFAULT_OCTAVE_RANGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_mode_cycle_round_trip() {
        let mut mode = SteppingMode::Forward;
        for _ in 0..SteppingMode::ALL.len() {
            mode = mode.next();
        }
        assert_eq!(mode, SteppingMode::Forward);

        for _ in 0..SteppingMode::ALL.len() {
            mode = mode.prev();
        }
        assert_eq!(mode, SteppingMode::Forward);
    }

    #[test]
    fn stepping_mode_from_name() {
        assert_eq!(SteppingMode::from_name("pingpong"), Some(SteppingMode::PingPong));
        assert_eq!(SteppingMode::from_name("Ping-Pong"), Some(SteppingMode::PingPong));
        assert_eq!(SteppingMode::from_name("skipTwo"), Some(SteppingMode::SkipTwo));
        assert_eq!(SteppingMode::from_name("randomWalk"), Some(SteppingMode::RandomWalk));
        assert_eq!(SteppingMode::from_name("sideways"), None);
    }

    #[test]
    fn sequencer_state_defaults() {
        let state = SequencerState::new(SequencerId::new(17));
        assert_eq!(state.slot_count, 16);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.direction, 1);
        assert_eq!(state.midi_channel, 1);
        assert_eq!(state.scale, Scale::Minor);
        assert!(state.playing);
    }
}
