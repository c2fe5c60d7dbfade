use std::path::{Path, PathBuf};

use serde::Deserialize;

use orbit_types::{Scale, SequencerId, SequencerState, SteppingMode, DEFAULT_BPM};

use crate::error::{EngineError, Result};
use crate::sequencer::MAX_OCTAVE_RANGE;
use crate::transport::{MAX_BPM, MIN_BPM};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<f64>,
    slot_count: Option<usize>,
    pulse_count: Option<usize>,
    root_note: Option<u8>,
    scale: Option<String>,
    octave_range: Option<u8>,
    stepping_mode: Option<String>,
    velocity: Option<u8>,
    probability: Option<u8>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    note_length_ms: Option<u64>,
    frame_rate: Option<u32>,
    seed: Option<u64>,
    midi_port: Option<String>,
}

pub struct Config {
    defaults: DefaultsConfig,
    runtime: RuntimeConfig,
}

impl Config {
    /// Embedded defaults overlaid with the user's config file, if any.
    pub fn load() -> Self {
        let mut config = Self::embedded();
        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => config.merge(user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }
        config
    }

    /// Only the built-in defaults.
    pub fn embedded() -> Self {
        let base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");
        Config {
            defaults: base.defaults,
            runtime: base.runtime,
        }
    }

    /// Embedded defaults overlaid with `contents`.
    pub fn parse(contents: &str) -> Result<Self> {
        let user: ConfigFile =
            toml::from_str(contents).map_err(|e| EngineError::Config(e.to_string()))?;
        let mut config = Self::embedded();
        config.merge(user);
        Ok(config)
    }

    /// Embedded defaults overlaid with an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    fn merge(&mut self, user: ConfigFile) {
        merge_defaults(&mut self.defaults, user.defaults);
        merge_runtime(&mut self.runtime, user.runtime);
    }

    /// Starting tempo (clamped to 20..=300).
    pub fn bpm(&self) -> f64 {
        let bpm = self.defaults.bpm.unwrap_or(DEFAULT_BPM);
        if bpm.is_finite() {
            bpm.clamp(MIN_BPM, MAX_BPM)
        } else {
            DEFAULT_BPM
        }
    }

    /// A new sequencer record carrying the configured defaults.
    pub fn sequencer_defaults(&self, id: SequencerId) -> SequencerState {
        let mut state = SequencerState::new(id);
        let d = &self.defaults;
        if let Some(slots) = d.slot_count {
            state.slot_count = slots.max(1);
        }
        if let Some(pulses) = d.pulse_count {
            state.pulse_count = pulses;
        }
        if let Some(root) = d.root_note {
            state.root_note = root.min(127);
        }
        if let Some(scale) = d.scale.as_deref().and_then(parse_scale) {
            state.scale = scale;
        }
        if let Some(octaves) = d.octave_range {
            state.octave_range = octaves.clamp(1, MAX_OCTAVE_RANGE);
        }
        if let Some(mode) = d.stepping_mode.as_deref().and_then(parse_stepping_mode) {
            state.stepping_mode = mode;
        }
        if let Some(velocity) = d.velocity {
            state.velocity = velocity.min(127);
        }
        if let Some(probability) = d.probability {
            state.probability = probability.min(100);
        }
        state
    }

    /// Length of directly played notes in seconds (clamped to 1 ms..10 s).
    pub fn note_length(&self) -> f64 {
        self.runtime.note_length_ms.unwrap_or(100).clamp(1, 10_000) as f64 / 1000.0
    }

    /// Driver tick rate in Hz (clamped to 10..=1000).
    pub fn frame_rate(&self) -> u32 {
        self.runtime.frame_rate.unwrap_or(120).clamp(10, 1000)
    }

    pub fn seed(&self) -> Option<u64> {
        self.runtime.seed
    }

    pub fn midi_port(&self) -> Option<&str> {
        self.runtime.midi_port.as_deref()
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("orbit").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.slot_count.is_some() {
        base.slot_count = user.slot_count;
    }
    if user.pulse_count.is_some() {
        base.pulse_count = user.pulse_count;
    }
    if user.root_note.is_some() {
        base.root_note = user.root_note;
    }
    if user.scale.is_some() {
        base.scale = user.scale;
    }
    if user.octave_range.is_some() {
        base.octave_range = user.octave_range;
    }
    if user.stepping_mode.is_some() {
        base.stepping_mode = user.stepping_mode;
    }
    if user.velocity.is_some() {
        base.velocity = user.velocity;
    }
    if user.probability.is_some() {
        base.probability = user.probability;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.note_length_ms.is_some() {
        base.note_length_ms = user.note_length_ms;
    }
    if user.frame_rate.is_some() {
        base.frame_rate = user.frame_rate;
    }
    if user.seed.is_some() {
        base.seed = user.seed;
    }
    if user.midi_port.is_some() {
        base.midi_port = user.midi_port;
    }
}

fn parse_scale(s: &str) -> Option<Scale> {
    let scale = Scale::from_name(s);
    if scale.is_none() {
        log::warn!(target: "config", "unknown scale '{}'", s);
    }
    scale
}

fn parse_stepping_mode(s: &str) -> Option<SteppingMode> {
    let mode = SteppingMode::from_name(s);
    if mode.is_none() {
        log::warn!(target: "config", "unknown stepping mode '{}'", s);
    }
    mode
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_config() {
        let config = Config::embedded();
        assert_eq!(config.bpm(), 120.0);
        let seq = config.sequencer_defaults(SequencerId::new(0));
        assert_eq!(seq.slot_count, 16);
        assert_eq!(seq.pulse_count, 5);
        assert_eq!(seq.root_note, 60);
        assert_eq!(seq.scale, Scale::Minor);
        assert_eq!(seq.stepping_mode, SteppingMode::Forward);
        assert!((config.note_length() - 0.1).abs() < 1e-12);
        assert_eq!(config.frame_rate(), 120);
        assert_eq!(config.seed(), None);
        assert_eq!(config.midi_port(), None);
    }

    #[test]
    fn test_user_values_override_field_by_field() {
        let config = Config::parse(
            r#"
            [defaults]
            bpm = 90
            scale = "harmonicMinor"
            stepping_mode = "pingpong"

            [runtime]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.bpm(), 90.0);
        let seq = config.sequencer_defaults(SequencerId::new(3));
        assert_eq!(seq.scale, Scale::HarmonicMinor);
        assert_eq!(seq.stepping_mode, SteppingMode::PingPong);
        // untouched fields keep the embedded defaults
        assert_eq!(seq.slot_count, 16);
        assert_eq!(seq.midi_channel, 3);
        assert_eq!(config.seed(), Some(7));
        assert_eq!(config.frame_rate(), 120);
    }

    #[test]
    fn test_accessors_clamp() {
        let config = Config::parse(
            r#"
            [defaults]
            bpm = 1000
            octave_range = 9
            slot_count = 0
            probability = 150

            [runtime]
            frame_rate = 1
            note_length_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.bpm(), 300.0);
        let seq = config.sequencer_defaults(SequencerId::new(0));
        assert_eq!(seq.octave_range, 4);
        assert_eq!(seq.slot_count, 1);
        assert_eq!(seq.probability, 100);
        assert_eq!(config.frame_rate(), 10);
        assert!((config.note_length() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let config = Config::parse("[defaults]\nscale = \"lydian\"\n").unwrap();
        assert_eq!(config.sequencer_defaults(SequencerId::new(0)).scale, Scale::Minor);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(matches!(Config::parse("[defaults"), Err(EngineError::Config(_))));
    }
}
