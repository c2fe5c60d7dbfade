use orbit_types::EnvConfig;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear ADSR with output in [0, 1].
///
/// Attack ramps from whatever value the envelope had when triggered; release
/// starts from the value at the moment of release, whichever stage that was.
#[derive(Debug, Clone)]
pub struct Envelope {
    config: EnvConfig,
    stage: EnvStage,
    stage_start: f64,
    start_value: f64,
    value: f64,
    finished: bool,
}

impl Envelope {
    pub fn new(config: EnvConfig) -> Result<Self> {
        validate(&config)?;
        Ok(Self {
            config,
            stage: EnvStage::Idle,
            stage_start: 0.0,
            start_value: 0.0,
            value: 0.0,
            finished: false,
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn configure(&mut self, config: EnvConfig) -> Result<()> {
        validate(&config)?;
        self.config = config;
        Ok(())
    }

    pub fn stage(&self) -> EnvStage {
        self.stage
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvStage::Idle
    }

    pub fn trigger(&mut self, now: f64) {
        self.update(now);
        self.stage = EnvStage::Attack;
        self.stage_start = now;
        self.start_value = self.value;
        self.finished = false;
    }

    pub fn release(&mut self, now: f64) {
        self.update(now);
        if self.stage == EnvStage::Idle {
            return;
        }
        self.stage = EnvStage::Release;
        self.stage_start = now;
        self.start_value = self.value;
    }

    pub fn tick(&mut self, now: f64) -> f64 {
        self.update(now);
        self.value
    }

    /// True once after a release runs out.
    pub fn take_finished(&mut self) -> bool {
        std::mem::take(&mut self.finished)
    }

    fn update(&mut self, now: f64) {
        loop {
            let elapsed = (now - self.stage_start).max(0.0);
            match self.stage {
                EnvStage::Idle => {
                    self.value = 0.0;
                    return;
                }
                EnvStage::Attack => {
                    let attack = self.config.attack;
                    if elapsed >= attack {
                        self.value = 1.0;
                        self.stage = EnvStage::Decay;
                        self.stage_start += attack;
                        continue;
                    }
                    self.value = self.start_value + (1.0 - self.start_value) * (elapsed / attack);
                    return;
                }
                EnvStage::Decay => {
                    let decay = self.config.decay;
                    let sustain = self.config.sustain;
                    if elapsed >= decay {
                        self.value = sustain;
                        self.stage = EnvStage::Sustain;
                        return;
                    }
                    self.value = 1.0 - (1.0 - sustain) * (elapsed / decay);
                    return;
                }
                EnvStage::Sustain => {
                    self.value = self.config.sustain;
                    return;
                }
                EnvStage::Release => {
                    let release = self.config.release;
                    if elapsed >= release {
                        self.value = 0.0;
                        self.stage = EnvStage::Idle;
                        self.finished = true;
                        return;
                    }
                    self.value = self.start_value * (1.0 - elapsed / release);
                    return;
                }
            }
        }
    }
}

fn validate(config: &EnvConfig) -> Result<()> {
    for (name, value) in [
        ("attack", config.attack),
        ("decay", config.decay),
        ("release", config.release),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::InvalidParameter { name, value });
        }
    }
    if !(0.0..=1.0).contains(&config.sustain) {
        return Err(EngineError::InvalidParameter { name: "sustain", value: config.sustain });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Envelope {
        Envelope::new(EnvConfig {
            attack: 1.0,
            decay: 1.0,
            sustain: 0.5,
            release: 2.0,
        })
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn full_cycle() {
        let mut e = env();
        assert!(close(e.tick(0.0), 0.0));
        e.trigger(10.0);
        assert!(close(e.tick(10.5), 0.5));
        assert!(close(e.tick(11.5), 0.75));
        assert_eq!(e.stage(), EnvStage::Decay);
        assert!(close(e.tick(13.0), 0.5));
        assert_eq!(e.stage(), EnvStage::Sustain);
        assert!(close(e.tick(100.0), 0.5));

        e.release(100.0);
        assert!(close(e.tick(101.0), 0.25));
        assert!(!e.take_finished());
        assert!(close(e.tick(102.0), 0.0));
        assert_eq!(e.stage(), EnvStage::Idle);
        assert!(e.take_finished());
        assert!(!e.take_finished());
    }

    #[test]
    fn early_release_starts_from_partial_value() {
        let mut e = env();
        e.trigger(0.0);
        e.release(0.3);
        assert_eq!(e.stage(), EnvStage::Release);
        assert!(close(e.value(), 0.3));
        let mut prev = e.value();
        for i in 1..=25 {
            let v = e.tick(0.3 + i as f64 * 0.1);
            assert!(v <= prev + 1e-12, "release must only fall, got {} after {}", v, prev);
            assert!(v < 1.0);
            prev = v;
        }
        assert_eq!(e.stage(), EnvStage::Idle);
    }

    #[test]
    fn zero_length_stages_skip_straight_through() {
        let mut e = Envelope::new(EnvConfig {
            attack: 0.0,
            decay: 0.0,
            sustain: 0.8,
            release: 0.0,
        })
        .unwrap();
        e.trigger(1.0);
        assert!(close(e.tick(1.0), 0.8));
        e.release(2.0);
        assert!(close(e.tick(2.0), 0.0));
        assert!(e.take_finished());
    }

    #[test]
    fn release_while_idle_is_ignored() {
        let mut e = env();
        e.release(5.0);
        assert_eq!(e.stage(), EnvStage::Idle);
        assert!(!e.take_finished());
    }

    #[test]
    fn retrigger_ramps_from_current_value() {
        let mut e = env();
        e.trigger(0.0);
        e.tick(5.0); // sustaining at 0.5
        e.trigger(5.0);
        assert!(close(e.tick(5.5), 0.75));
    }

    #[test]
    fn rejects_bad_settings() {
        let bad = EnvConfig { sustain: 1.5, ..EnvConfig::default() };
        assert!(Envelope::new(bad).is_err());
        let bad = EnvConfig { attack: -0.1, ..EnvConfig::default() };
        assert!(matches!(
            Envelope::new(bad),
            Err(EngineError::InvalidParameter { name: "attack", .. })
        ));
    }
}
