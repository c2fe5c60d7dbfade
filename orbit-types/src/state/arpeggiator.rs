use serde::{Deserialize, Serialize};

/// Arpeggiator configuration, stored per-sequencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArpeggiatorConfig {
    pub enabled: bool,
    pub pattern: ArpPattern,
    pub division: ArpDivision,
    pub octave_range: u8, // 1-4
    pub gate_length: f64, // 0.0-1.0 (note length as fraction of subdivision)
    pub velocity: u8,
}

impl Default for ArpeggiatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pattern: ArpPattern::Up,
            division: ArpDivision::Quarter,
            octave_range: 1,
            gate_length: 0.5,
            velocity: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpPattern {
    Up,
    Down,
    UpDown,
    Random,
    InsideOut,
    OutsideIn,
    Pendulum,
    Spiral,
    Zigzag,
}

impl ArpPattern {
    pub const ALL: [ArpPattern; 9] = [
        ArpPattern::Up,
        ArpPattern::Down,
        ArpPattern::UpDown,
        ArpPattern::Random,
        ArpPattern::InsideOut,
        ArpPattern::OutsideIn,
        ArpPattern::Pendulum,
        ArpPattern::Spiral,
        ArpPattern::Zigzag,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArpPattern::Up => "Up",
            ArpPattern::Down => "Down",
            ArpPattern::UpDown => "Up/Down",
            ArpPattern::Random => "Random",
            ArpPattern::InsideOut => "Inside Out",
            ArpPattern::OutsideIn => "Outside In",
            ArpPattern::Pendulum => "Pendulum",
            ArpPattern::Spiral => "Spiral",
            ArpPattern::Zigzag => "Zigzag",
        }
    }

    pub fn from_name(name: &str) -> Option<ArpPattern> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "up" => Some(ArpPattern::Up),
            "down" => Some(ArpPattern::Down),
            "updown" => Some(ArpPattern::UpDown),
            "random" => Some(ArpPattern::Random),
            "insideout" => Some(ArpPattern::InsideOut),
            "outsidein" => Some(ArpPattern::OutsideIn),
            "pendulum" => Some(ArpPattern::Pendulum),
            "spiral" => Some(ArpPattern::Spiral),
            "zigzag" => Some(ArpPattern::Zigzag),
            _ => None,
        }
    }

    pub fn next(&self) -> ArpPattern {
        let idx = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> ArpPattern {
        let idx = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Subdivision of one transport beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpDivision {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl ArpDivision {
    pub fn name(&self) -> &'static str {
        match self {
            ArpDivision::Whole => "1/1",
            ArpDivision::Half => "1/2",
            ArpDivision::Quarter => "1/4",
            ArpDivision::Eighth => "1/8",
            ArpDivision::Sixteenth => "1/16",
        }
    }

    /// Arpeggiated notes per transport beat
    pub fn notes_per_beat(&self) -> f64 {
        match self {
            ArpDivision::Whole => 1.0,
            ArpDivision::Half => 2.0,
            ArpDivision::Quarter => 4.0,
            ArpDivision::Eighth => 8.0,
            ArpDivision::Sixteenth => 16.0,
        }
    }

    pub fn next(&self) -> ArpDivision {
        match self {
            ArpDivision::Whole => ArpDivision::Half,
            ArpDivision::Half => ArpDivision::Quarter,
            ArpDivision::Quarter => ArpDivision::Eighth,
            ArpDivision::Eighth => ArpDivision::Sixteenth,
            ArpDivision::Sixteenth => ArpDivision::Whole,
        }
    }

    pub fn prev(&self) -> ArpDivision {
        match self {
            ArpDivision::Whole => ArpDivision::Sixteenth,
            ArpDivision::Half => ArpDivision::Whole,
            ArpDivision::Quarter => ArpDivision::Half,
            ArpDivision::Eighth => ArpDivision::Quarter,
            ArpDivision::Sixteenth => ArpDivision::Eighth,
        }
    }
}
