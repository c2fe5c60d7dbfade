use std::f64::consts::TAU;

use orbit_types::{LfoConfig, LfoShape};

use crate::error::{EngineError, Result};
use crate::rng::Rng;

/// Free-running low-frequency oscillator with output in [0, 1].
#[derive(Debug, Clone)]
pub struct Lfo {
    config: LfoConfig,
    phase: f64,
    previous_phase: f64,
    held: f64,
    last_time: Option<f64>,
}

impl Lfo {
    pub fn new(config: LfoConfig) -> Result<Self> {
        validate(&config)?;
        Ok(Self {
            config,
            phase: 0.0,
            previous_phase: 0.0,
            held: 0.5,
            last_time: None,
        })
    }

    pub fn config(&self) -> &LfoConfig {
        &self.config
    }

    /// Replace rate/depth/shape without resetting the phase.
    pub fn configure(&mut self, config: LfoConfig) -> Result<()> {
        validate(&config)?;
        self.config = config;
        Ok(())
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Depth as a 0-1 fraction
    pub fn depth_fraction(&self) -> f64 {
        self.config.depth / 100.0
    }

    /// Advance the phase by the time since the previous tick and shape it.
    /// The first tick only anchors the clock.
    pub fn tick(&mut self, now: f64, rng: &mut Rng) -> f64 {
        let elapsed = match self.last_time {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last_time = Some(now);
        self.phase = (self.phase + elapsed * self.config.rate).rem_euclid(1.0);
        if self.config.shape == LfoShape::Random && self.phase < self.previous_phase {
            self.held = rng.next_f64();
        }
        self.previous_phase = self.phase;
        shape_value(self.config.shape, self.phase, self.held)
    }
}

/// Waveform at `phase` (0-1). `held` is the current sample for the random shape.
pub fn shape_value(shape: LfoShape, phase: f64, held: f64) -> f64 {
    match shape {
        LfoShape::Sine => 0.5 + 0.5 * (TAU * phase).sin(),
        LfoShape::Triangle => ((phase * 4.0 + 3.0).rem_euclid(4.0) - 2.0).abs() / 2.0,
        LfoShape::Square => {
            if phase < 0.5 {
                1.0
            } else {
                0.0
            }
        }
        LfoShape::Sawtooth => phase,
        LfoShape::Ramp => 1.0 - phase,
        LfoShape::Random => held,
    }
}

fn validate(config: &LfoConfig) -> Result<()> {
    if !config.rate.is_finite() || config.rate < 0.0 {
        return Err(EngineError::InvalidParameter { name: "rate", value: config.rate });
    }
    if !(0.0..=100.0).contains(&config.depth) {
        return Err(EngineError::InvalidParameter { name: "depth", value: config.depth });
    }
    Ok(())
}
