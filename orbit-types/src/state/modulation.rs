use serde::{Deserialize, Serialize};

use crate::{ModSourceId, SequencerId, TargetRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LfoShape {
    Sine,
    Triangle,
    Square,
    Sawtooth,
    Ramp,
    Random,
}

impl LfoShape {
    pub const ALL: [LfoShape; 6] = [
        LfoShape::Sine,
        LfoShape::Triangle,
        LfoShape::Square,
        LfoShape::Sawtooth,
        LfoShape::Ramp,
        LfoShape::Random,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LfoShape::Sine => "Sine",
            LfoShape::Triangle => "Triangle",
            LfoShape::Square => "Square",
            LfoShape::Sawtooth => "Sawtooth",
            LfoShape::Ramp => "Ramp",
            LfoShape::Random => "Random",
        }
    }

    pub fn next(&self) -> LfoShape {
        match self {
            LfoShape::Sine => LfoShape::Triangle,
            LfoShape::Triangle => LfoShape::Square,
            LfoShape::Square => LfoShape::Sawtooth,
            LfoShape::Sawtooth => LfoShape::Ramp,
            LfoShape::Ramp => LfoShape::Random,
            LfoShape::Random => LfoShape::Sine,
        }
    }

    pub fn from_name(name: &str) -> Option<LfoShape> {
        match name.to_ascii_lowercase().as_str() {
            "sine" => Some(LfoShape::Sine),
            "triangle" => Some(LfoShape::Triangle),
            "square" => Some(LfoShape::Square),
            "sawtooth" | "saw" => Some(LfoShape::Sawtooth),
            "ramp" => Some(LfoShape::Ramp),
            "random" => Some(LfoShape::Random),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LfoConfig {
    /// Cycles per second
    pub rate: f64,
    /// Percent, 0-100
    pub depth: f64,
    pub shape: LfoShape,
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            depth: 50.0,
            shape: LfoShape::Sine,
        }
    }
}

/// ADSR times in seconds; sustain is a 0-1 level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.7,
            release: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModSourceConfig {
    Lfo(LfoConfig),
    Envelope(EnvConfig),
}

impl ModSourceConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ModSourceConfig::Lfo(_) => "LFO",
            ModSourceConfig::Envelope(_) => "Envelope",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModSourceRecord {
    pub id: ModSourceId,
    pub config: ModSourceConfig,
}

/// How a bound parameter interprets modulation output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetKind {
    Continuous { min: f64, max: f64 },
    /// An enumerated parameter (e.g. a scale or mode picker)
    Discrete { option_count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// Swings around the original value
    #[default]
    Bipolar,
    /// Only pushes upward from the original value
    Unipolar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub source: ModSourceId,
    pub target: TargetRef,
    pub kind: TargetKind,
    pub original_value: f64,
    #[serde(default)]
    pub polarity: Polarity,
    /// Sequencer whose parameter this is; the binding goes away with it
    #[serde(default)]
    pub owner: Option<SequencerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfo_shape_next_cycles() {
        let mut shape = LfoShape::Sine;
        for _ in 0..LfoShape::ALL.len() {
            shape = shape.next();
        }
        assert_eq!(shape, LfoShape::Sine);
        assert_eq!(LfoShape::Ramp.next(), LfoShape::Random);
    }

    #[test]
    fn lfo_shape_from_name() {
        assert_eq!(LfoShape::from_name("sawtooth"), Some(LfoShape::Sawtooth));
        assert_eq!(LfoShape::from_name("Saw"), Some(LfoShape::Sawtooth));
        assert_eq!(LfoShape::from_name("Ramp"), Some(LfoShape::Ramp));
        assert_eq!(LfoShape::from_name("noise"), None);
    }

    #[test]
    fn binding_polarity_defaults_to_bipolar() {
        let json = r#"{"source":1,"target":4,"kind":{"Continuous":{"min":0.0,"max":1.0}},"original_value":0.5}"#;
        let binding: BindingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(binding.polarity, Polarity::Bipolar);
        assert_eq!(binding.owner, None);
        assert_eq!(binding.target, TargetRef::new(4));
    }

    #[test]
    fn source_kind_names() {
        assert_eq!(ModSourceConfig::Lfo(LfoConfig::default()).kind_name(), "LFO");
        assert_eq!(ModSourceConfig::Envelope(EnvConfig::default()).kind_name(), "Envelope");
    }
}
