//! Per-sequencer arpeggiator: orders a held chord into single notes played
//! at a subdivision of the transport beat.

use orbit_types::{ArpAction, ArpPattern, ArpeggiatorConfig};

use crate::error::{EngineError, Result};
use crate::rng::Rng;

pub const MAX_OCTAVES: u8 = 4;

/// One arpeggiated note and how long it should sound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpNote {
    pub pitch: u8,
    pub velocity: u8,
    /// Seconds until the matching note-off
    pub gate: f64,
}

#[derive(Debug, Clone)]
pub struct Arpeggiator {
    config: ArpeggiatorConfig,
    /// Notes as handed over by the last triggering step
    source_notes: Vec<u8>,
    /// Source notes spread over the octave range
    held: Vec<u8>,
    cursor: usize,
    last_trigger: f64,
    velocity: u8,
}

impl Default for Arpeggiator {
    fn default() -> Self {
        Self {
            config: ArpeggiatorConfig::default(),
            source_notes: Vec::new(),
            held: Vec::new(),
            cursor: 0,
            last_trigger: 0.0,
            velocity: ArpeggiatorConfig::default().velocity,
        }
    }
}

impl Arpeggiator {
    pub fn new(config: ArpeggiatorConfig) -> Result<Self> {
        validate(&config)?;
        let velocity = config.velocity;
        Ok(Self {
            config,
            velocity,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &ArpeggiatorConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn held_notes(&self) -> &[u8] {
        &self.held
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// A new step fired: replace the held notes and restart the pattern.
    pub fn on_note_trigger(&mut self, notes: &[u8], velocity: u8, now: f64) {
        self.source_notes = notes.to_vec();
        self.held = spread_octaves(&self.source_notes, self.config.octave_range);
        self.cursor = 0;
        self.last_trigger = now;
        self.velocity = velocity;
        log::trace!(target: "arp", "holding {:?}", self.held);
    }

    /// Seconds between arpeggiated notes at `bpm`.
    pub fn subdivision_interval(&self, bpm: f64) -> f64 {
        (60.0 / bpm) / self.config.division.notes_per_beat()
    }

    /// Emit the next note once a subdivision has passed since the last one.
    pub fn tick(&mut self, now: f64, bpm: f64, rng: &mut Rng) -> Option<ArpNote> {
        if !self.config.enabled || self.held.is_empty() {
            return None;
        }
        let interval = self.subdivision_interval(bpm);
        if now - self.last_trigger < interval {
            return None;
        }
        let pitch = ordered_note(&self.held, self.cursor, self.config.pattern, rng);
        self.cursor = (self.cursor + 1) % effective_length(self.config.pattern, self.held.len());
        self.last_trigger = now;
        Some(ArpNote {
            pitch,
            velocity: self.velocity,
            gate: interval * self.config.gate_length,
        })
    }

    /// Disabling drops the held notes; the owner flushes any pending note-offs.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        if !enabled {
            self.source_notes.clear();
            self.held.clear();
            self.cursor = 0;
        }
    }

    pub fn set_pattern(&mut self, pattern: ArpPattern) {
        self.config.pattern = pattern;
        self.cursor = 0;
    }

    pub fn set_gate_length(&mut self, gate: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&gate) {
            return Err(EngineError::InvalidParameter { name: "gate_length", value: gate });
        }
        self.config.gate_length = gate;
        Ok(())
    }

    pub fn set_octave_range(&mut self, octaves: u8) -> Result<()> {
        if !(1..=MAX_OCTAVES).contains(&octaves) {
            return Err(EngineError::InvalidOctaveRange(octaves));
        }
        self.config.octave_range = octaves;
        self.held = spread_octaves(&self.source_notes, octaves);
        self.cursor = 0;
        Ok(())
    }

    pub fn set_velocity(&mut self, velocity: u8) -> Result<()> {
        if velocity > 127 {
            return Err(EngineError::InvalidVelocity(velocity));
        }
        self.config.velocity = velocity;
        self.velocity = velocity;
        Ok(())
    }

    pub fn apply(&mut self, action: &ArpAction) -> Result<()> {
        match action {
            ArpAction::SetEnabled(on) => self.set_enabled(*on),
            ArpAction::Toggle => self.set_enabled(!self.config.enabled),
            ArpAction::SetPattern(p) => self.set_pattern(*p),
            ArpAction::CyclePattern => self.set_pattern(self.config.pattern.next()),
            ArpAction::SetDivision(d) => self.config.division = *d,
            ArpAction::SetGateLength(g) => self.set_gate_length(*g)?,
            ArpAction::SetOctaveRange(o) => self.set_octave_range(*o)?,
            ArpAction::SetVelocity(v) => self.set_velocity(*v)?,
        }
        Ok(())
    }
}

fn validate(config: &ArpeggiatorConfig) -> Result<()> {
    if !(1..=MAX_OCTAVES).contains(&config.octave_range) {
        return Err(EngineError::InvalidOctaveRange(config.octave_range));
    }
    if !(0.0..=1.0).contains(&config.gate_length) {
        return Err(EngineError::InvalidParameter {
            name: "gate_length",
            value: config.gate_length,
        });
    }
    if config.velocity > 127 {
        return Err(EngineError::InvalidVelocity(config.velocity));
    }
    Ok(())
}

/// Held notes repeated an octave higher per extra octave; pitches past 127 are dropped.
fn spread_octaves(notes: &[u8], octaves: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(notes.len() * octaves as usize);
    for octave in 0..octaves.max(1) {
        for &note in notes {
            let pitched = note as u16 + octave as u16 * 12;
            if pitched <= 127 {
                out.push(pitched as u8);
            }
        }
    }
    out
}

/// How many cursor positions a pattern spans before repeating.
pub fn effective_length(pattern: ArpPattern, len: usize) -> usize {
    match pattern {
        ArpPattern::UpDown | ArpPattern::Pendulum | ArpPattern::Zigzag if len > 1 => 2 * len - 2,
        ArpPattern::UpDown | ArpPattern::Pendulum | ArpPattern::Zigzag => 1,
        _ => len.max(1),
    }
}

/// Note for cursor position `i`. `notes` must be non-empty.
pub fn ordered_note(notes: &[u8], i: usize, pattern: ArpPattern, rng: &mut Rng) -> u8 {
    let len = notes.len();
    let last = len - 1;
    let idx = match pattern {
        ArpPattern::Up => i % len,
        ArpPattern::Down => last - i % len,
        ArpPattern::UpDown => {
            if len == 1 {
                0
            } else {
                let total = 2 * len - 2;
                let adj = i % total;
                if adj < len {
                    adj
                } else {
                    total - adj
                }
            }
        }
        ArpPattern::Random => rng.below(len),
        ArpPattern::InsideOut => {
            let mid = len / 2;
            if i % 2 == 0 {
                mid + i / 2
            } else {
                mid.saturating_sub(1 + i / 2)
            }
        }
        ArpPattern::OutsideIn => {
            if i % 2 == 0 {
                i / 2
            } else {
                last.saturating_sub(i / 2)
            }
        }
        ArpPattern::Pendulum => {
            if len == 1 {
                0
            } else {
                let pos = i % last;
                if i % 2 == 0 {
                    pos
                } else {
                    last - pos
                }
            }
        }
        ArpPattern::Spiral => (i * 3) % len,
        ArpPattern::Zigzag => {
            if i % 2 == 0 {
                i / 2
            } else {
                (i / 2 + 2).min(last)
            }
        }
    };
    notes[idx.min(last)]
}
