use std::collections::BTreeMap;

use orbit_types::{
    BindingRecord, ModSourceConfig, ModSourceId, ModSourceRecord, Polarity, SequencerId,
    TargetKind, TargetRef,
};

use super::envelope::Envelope;
use super::lfo::Lfo;
use crate::error::{EngineError, Result};
use crate::rng::Rng;

/// A live modulation source.
#[derive(Debug, Clone)]
pub enum ModSource {
    Lfo(Lfo),
    Envelope(Envelope),
}

impl ModSource {
    pub fn from_config(config: ModSourceConfig) -> Result<Self> {
        match config {
            ModSourceConfig::Lfo(cfg) => Ok(ModSource::Lfo(Lfo::new(cfg)?)),
            ModSourceConfig::Envelope(cfg) => Ok(ModSource::Envelope(Envelope::new(cfg)?)),
        }
    }

    pub fn config(&self) -> ModSourceConfig {
        match self {
            ModSource::Lfo(lfo) => ModSourceConfig::Lfo(lfo.config().clone()),
            ModSource::Envelope(env) => ModSourceConfig::Envelope(env.config().clone()),
        }
    }

    fn depth_fraction(&self) -> f64 {
        match self {
            ModSource::Lfo(lfo) => lfo.depth_fraction(),
            ModSource::Envelope(_) => 1.0,
        }
    }
}

/// One frame of a source's output.
#[derive(Debug, Clone, Copy)]
enum SourceOutput {
    Value { value: f64, depth: f64 },
    /// Envelope release just ran out; targets go back to their original value
    Finished,
    Silent,
}

/// Patch table between modulation sources and external parameters.
///
/// Each target has at most one binding. The router never touches parameters
/// itself; `tick` returns `(target, value)` pairs for the owner to apply.
#[derive(Debug, Clone, Default)]
pub struct ModulationRouter {
    sources: BTreeMap<ModSourceId, ModSource>,
    bindings: BTreeMap<TargetRef, BindingRecord>,
    next_id: u32,
}

impl ModulationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, config: ModSourceConfig) -> Result<ModSourceId> {
        let source = ModSource::from_config(config)?;
        let id = ModSourceId::new(self.next_id);
        self.next_id = following_id(id)?;
        log::info!(target: "modulation", "added {} source {}", source.config().kind_name(), id);
        self.sources.insert(id, source);
        Ok(id)
    }

    /// Insert a source under a known id (used when restoring a session).
    pub fn insert_source(&mut self, record: ModSourceRecord) -> Result<()> {
        let source = ModSource::from_config(record.config)?;
        self.next_id = self.next_id.max(following_id(record.id)?);
        self.sources.insert(record.id, source);
        Ok(())
    }

    /// Remove a source and every binding it drives. Returns the restore
    /// values for the detached targets.
    pub fn remove_source(&mut self, id: ModSourceId) -> Result<Vec<(TargetRef, f64)>> {
        if self.sources.remove(&id).is_none() {
            return Err(EngineError::UnknownSource(id));
        }
        let targets = self.targets_of(id);
        let restores = targets
            .into_iter()
            .filter_map(|target| self.unbind(target))
            .collect();
        log::info!(target: "modulation", "removed source {}", id);
        Ok(restores)
    }

    /// Update a source's settings. Switching between LFO and envelope
    /// replaces the source but keeps its bindings.
    pub fn configure_source(&mut self, id: ModSourceId, config: ModSourceConfig) -> Result<()> {
        let source = self
            .sources
            .get_mut(&id)
            .ok_or(EngineError::UnknownSource(id))?;
        match (source, config) {
            (ModSource::Lfo(lfo), ModSourceConfig::Lfo(cfg)) => lfo.configure(cfg),
            (ModSource::Envelope(env), ModSourceConfig::Envelope(cfg)) => env.configure(cfg),
            (source, config) => {
                *source = ModSource::from_config(config)?;
                Ok(())
            }
        }
    }

    pub fn source(&self, id: ModSourceId) -> Option<&ModSource> {
        self.sources.get(&id)
    }

    pub fn sources(&self) -> impl Iterator<Item = (ModSourceId, &ModSource)> {
        self.sources.iter().map(|(id, s)| (*id, s))
    }

    pub fn bindings(&self) -> impl Iterator<Item = &BindingRecord> {
        self.bindings.values()
    }

    pub fn binding(&self, target: TargetRef) -> Option<&BindingRecord> {
        self.bindings.get(&target)
    }

    /// Targets currently driven by `source`.
    pub fn targets_of(&self, source: ModSourceId) -> Vec<TargetRef> {
        self.bindings
            .values()
            .filter(|b| b.source == source)
            .map(|b| b.target)
            .collect()
    }

    /// Bind a source to a target, replacing whatever was bound there.
    /// Returns the displaced binding.
    pub fn bind(&mut self, binding: BindingRecord) -> Result<Option<BindingRecord>> {
        if !self.sources.contains_key(&binding.source) {
            return Err(EngineError::UnknownSource(binding.source));
        }
        match binding.kind {
            TargetKind::Continuous { min, max } => {
                if !min.is_finite() || !max.is_finite() || min >= max {
                    return Err(EngineError::InvalidRange { min, max });
                }
            }
            TargetKind::Discrete { option_count } => {
                if option_count == 0 {
                    return Err(EngineError::InvalidOptionCount);
                }
            }
        }
        log::debug!(target: "modulation", "bind source {} -> {}", binding.source, binding.target);
        let previous = self.bindings.insert(binding.target, binding);
        if let Some(prev) = &previous {
            log::debug!(target: "modulation", "{} detached from source {}", prev.target, prev.source);
        }
        Ok(previous)
    }

    /// Remove the binding on `target`; returns the value to restore.
    pub fn unbind(&mut self, target: TargetRef) -> Option<(TargetRef, f64)> {
        self.bindings
            .remove(&target)
            .map(|b| (b.target, b.original_value))
    }

    /// Remove every binding owned by `owner`; returns the values to restore.
    pub fn unbind_owner(&mut self, owner: SequencerId) -> Vec<(TargetRef, f64)> {
        let targets: Vec<TargetRef> = self
            .bindings
            .values()
            .filter(|b| b.owner == Some(owner))
            .map(|b| b.target)
            .collect();
        if !targets.is_empty() {
            log::debug!(target: "modulation", "detaching {} bindings of sequencer {}", targets.len(), owner);
        }
        targets
            .into_iter()
            .filter_map(|target| self.unbind(target))
            .collect()
    }

    pub fn trigger_envelope(&mut self, id: ModSourceId, now: f64) -> Result<()> {
        match self.sources.get_mut(&id) {
            Some(ModSource::Envelope(env)) => {
                env.trigger(now);
                Ok(())
            }
            Some(ModSource::Lfo(_)) => {
                log::warn!(target: "modulation", "source {} is an LFO, ignoring trigger", id);
                Ok(())
            }
            None => Err(EngineError::UnknownSource(id)),
        }
    }

    pub fn release_envelope(&mut self, id: ModSourceId, now: f64) -> Result<()> {
        match self.sources.get_mut(&id) {
            Some(ModSource::Envelope(env)) => {
                env.release(now);
                Ok(())
            }
            Some(ModSource::Lfo(_)) => {
                log::warn!(target: "modulation", "source {} is an LFO, ignoring release", id);
                Ok(())
            }
            None => Err(EngineError::UnknownSource(id)),
        }
    }

    /// Advance every source once and resolve every binding.
    pub fn tick(&mut self, now: f64, rng: &mut Rng) -> Vec<(TargetRef, f64)> {
        let outputs: BTreeMap<ModSourceId, SourceOutput> = self
            .sources
            .iter_mut()
            .map(|(id, source)| {
                let depth = source.depth_fraction();
                let output = match source {
                    ModSource::Lfo(lfo) => SourceOutput::Value {
                        value: lfo.tick(now, rng),
                        depth,
                    },
                    ModSource::Envelope(env) => {
                        let value = env.tick(now);
                        if env.take_finished() {
                            SourceOutput::Finished
                        } else if env.is_active() {
                            SourceOutput::Value { value, depth }
                        } else {
                            SourceOutput::Silent
                        }
                    }
                };
                (*id, output)
            })
            .collect();

        let mut updates = Vec::new();
        for binding in self.bindings.values() {
            match outputs.get(&binding.source) {
                Some(SourceOutput::Value { value, depth }) => {
                    updates.push((binding.target, resolve(binding, *value, *depth)));
                }
                Some(SourceOutput::Finished) => {
                    updates.push((binding.target, binding.original_value));
                }
                Some(SourceOutput::Silent) => {}
                None => {
                    log::warn!(
                        target: "modulation",
                        "binding on {} references missing source {}",
                        binding.target,
                        binding.source
                    );
                }
            }
        }
        updates
    }
}

fn following_id(id: ModSourceId) -> Result<u32> {
    id.get()
        .checked_add(1)
        .ok_or(EngineError::IdOverflow { kind: "source", id: id.get() })
}

/// Map a source value onto a bound parameter.
pub fn resolve(binding: &BindingRecord, value: f64, depth: f64) -> f64 {
    match binding.kind {
        TargetKind::Continuous { min, max } => {
            let span = max - min;
            let offset = match binding.polarity {
                Polarity::Bipolar => (value - 0.5) * depth * span,
                Polarity::Unipolar => value * depth * span,
            };
            (binding.original_value + offset).clamp(min, max)
        }
        TargetKind::Discrete { option_count } => {
            let n = option_count.max(1) as f64;
            ((value * depth * n).floor() % n).max(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_types::{EnvConfig, LfoConfig, LfoShape};

    fn square_lfo(depth: f64) -> ModSourceConfig {
        ModSourceConfig::Lfo(LfoConfig {
            rate: 1.0,
            depth,
            shape: LfoShape::Square,
        })
    }

    fn continuous(source: ModSourceId, target: u32, original: f64) -> BindingRecord {
        BindingRecord {
            source,
            target: TargetRef::new(target),
            kind: TargetKind::Continuous { min: 0.0, max: 100.0 },
            original_value: original,
            polarity: Polarity::Bipolar,
            owner: None,
        }
    }

    #[test]
    fn second_binding_replaces_first() {
        let mut router = ModulationRouter::new();
        let a = router.add_source(square_lfo(50.0)).unwrap();
        let b = router.add_source(square_lfo(50.0)).unwrap();
        router.bind(continuous(a, 1, 50.0)).unwrap();
        router.bind(continuous(a, 2, 50.0)).unwrap();
        let displaced = router.bind(continuous(b, 1, 50.0)).unwrap();

        assert_eq!(displaced.map(|d| d.source), Some(a));
        assert_eq!(router.targets_of(a), vec![TargetRef::new(2)]);
        assert_eq!(router.targets_of(b), vec![TargetRef::new(1)]);
        assert_eq!(router.bindings().count(), 2);
    }

    #[test]
    fn bipolar_continuous_formula() {
        let mut router = ModulationRouter::new();
        let mut rng = Rng::new(1);
        let src = router.add_source(square_lfo(50.0)).unwrap();
        router.bind(continuous(src, 1, 50.0)).unwrap();
        // square is high at phase 0: 50 + 0.5 * 0.5 * 100
        let updates = router.tick(0.0, &mut rng);
        assert_eq!(updates, vec![(TargetRef::new(1), 75.0)]);
        // low half: 50 - 25
        let updates = router.tick(0.6, &mut rng);
        assert_eq!(updates, vec![(TargetRef::new(1), 25.0)]);
    }

    #[test]
    fn continuous_output_clamps() {
        let binding = BindingRecord {
            original_value: 95.0,
            ..continuous(ModSourceId::new(0), 1, 0.0)
        };
        assert_eq!(resolve(&binding, 1.0, 1.0), 100.0);
        let binding = BindingRecord {
            original_value: 5.0,
            ..continuous(ModSourceId::new(0), 1, 0.0)
        };
        assert_eq!(resolve(&binding, 0.0, 1.0), 0.0);
    }

    #[test]
    fn unipolar_pushes_up_only() {
        let binding = BindingRecord {
            polarity: Polarity::Unipolar,
            ..continuous(ModSourceId::new(0), 1, 20.0)
        };
        assert_eq!(resolve(&binding, 0.0, 1.0), 20.0);
        assert_eq!(resolve(&binding, 0.5, 1.0), 70.0);
    }

    #[test]
    fn discrete_formula_wraps() {
        let binding = BindingRecord {
            source: ModSourceId::new(0),
            target: TargetRef::new(3),
            kind: TargetKind::Discrete { option_count: 5 },
            original_value: 0.0,
            polarity: Polarity::Bipolar,
            owner: None,
        };
        assert_eq!(resolve(&binding, 0.0, 1.0), 0.0);
        assert_eq!(resolve(&binding, 0.5, 1.0), 2.0);
        assert_eq!(resolve(&binding, 0.99, 1.0), 4.0);
        assert_eq!(resolve(&binding, 1.0, 1.0), 0.0);
        assert_eq!(resolve(&binding, 1.0, 0.5), 2.0);
    }

    #[test]
    fn bind_validation() {
        let mut router = ModulationRouter::new();
        assert!(matches!(
            router.bind(continuous(ModSourceId::new(9), 1, 0.0)),
            Err(EngineError::UnknownSource(_))
        ));
        let src = router.add_source(square_lfo(50.0)).unwrap();
        let bad = BindingRecord {
            kind: TargetKind::Continuous { min: 5.0, max: 5.0 },
            ..continuous(src, 1, 5.0)
        };
        assert!(matches!(router.bind(bad), Err(EngineError::InvalidRange { .. })));
        let bad = BindingRecord {
            kind: TargetKind::Discrete { option_count: 0 },
            ..continuous(src, 1, 0.0)
        };
        assert!(matches!(router.bind(bad), Err(EngineError::InvalidOptionCount)));
    }

    #[test]
    fn unbind_and_remove_return_restore_values() {
        let mut router = ModulationRouter::new();
        let src = router.add_source(square_lfo(50.0)).unwrap();
        router.bind(continuous(src, 1, 10.0)).unwrap();
        router.bind(continuous(src, 2, 20.0)).unwrap();

        assert_eq!(router.unbind(TargetRef::new(1)), Some((TargetRef::new(1), 10.0)));
        assert_eq!(router.unbind(TargetRef::new(1)), None);

        let restores = router.remove_source(src).unwrap();
        assert_eq!(restores, vec![(TargetRef::new(2), 20.0)]);
        assert_eq!(router.bindings().count(), 0);
        assert!(router.remove_source(src).is_err());
    }

    #[test]
    fn envelope_emits_while_active_then_restores_once() {
        let mut router = ModulationRouter::new();
        let mut rng = Rng::new(1);
        let env = router
            .add_source(ModSourceConfig::Envelope(EnvConfig {
                attack: 1.0,
                decay: 0.0,
                sustain: 1.0,
                release: 1.0,
            }))
            .unwrap();
        router
            .bind(BindingRecord {
                polarity: Polarity::Unipolar,
                ..continuous(env, 7, 10.0)
            })
            .unwrap();

        assert!(router.tick(0.0, &mut rng).is_empty());
        router.trigger_envelope(env, 0.0).unwrap();
        assert_eq!(router.tick(0.5, &mut rng), vec![(TargetRef::new(7), 60.0)]);
        router.release_envelope(env, 2.0).unwrap();
        assert_eq!(router.tick(2.5, &mut rng), vec![(TargetRef::new(7), 60.0)]);
        assert_eq!(router.tick(3.0, &mut rng), vec![(TargetRef::new(7), 10.0)]);
        assert!(router.tick(3.5, &mut rng).is_empty());
    }

    #[test]
    fn configure_switches_kind_and_keeps_bindings() {
        let mut router = ModulationRouter::new();
        let src = router.add_source(square_lfo(50.0)).unwrap();
        router.bind(continuous(src, 1, 50.0)).unwrap();
        router
            .configure_source(src, ModSourceConfig::Envelope(EnvConfig::default()))
            .unwrap();
        assert!(matches!(router.source(src), Some(ModSource::Envelope(_))));
        assert_eq!(router.targets_of(src), vec![TargetRef::new(1)]);
        assert!(router
            .configure_source(ModSourceId::new(42), square_lfo(10.0))
            .is_err());
    }

    #[test]
    fn insert_source_bumps_next_id() {
        let mut router = ModulationRouter::new();
        router
            .insert_source(ModSourceRecord {
                id: ModSourceId::new(5),
                config: square_lfo(20.0),
            })
            .unwrap();
        assert_eq!(router.add_source(square_lfo(20.0)).unwrap(), ModSourceId::new(6));
    }

    #[test]
    fn insert_source_at_top_id_is_rejected() {
        let mut router = ModulationRouter::new();
        let err = router
            .insert_source(ModSourceRecord {
                id: ModSourceId::new(u32::MAX),
                config: square_lfo(20.0),
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::IdOverflow { kind: "source", id: u32::MAX }));
        assert_eq!(router.sources().count(), 0);

        router
            .insert_source(ModSourceRecord {
                id: ModSourceId::new(u32::MAX - 1),
                config: square_lfo(20.0),
            })
            .unwrap();
        assert!(matches!(
            router.add_source(square_lfo(20.0)),
            Err(EngineError::IdOverflow { .. })
        ));
        assert_eq!(router.sources().count(), 1);
    }

    #[test]
    fn unbind_owner_only_takes_that_owners_bindings() {
        let mut router = ModulationRouter::new();
        let src = router.add_source(square_lfo(50.0)).unwrap();
        let a = SequencerId::new(0);
        let b = SequencerId::new(1);
        router
            .bind(BindingRecord { owner: Some(a), ..continuous(src, 1, 10.0) })
            .unwrap();
        router
            .bind(BindingRecord { owner: Some(b), ..continuous(src, 2, 20.0) })
            .unwrap();
        router
            .bind(BindingRecord { owner: Some(a), ..continuous(src, 3, 30.0) })
            .unwrap();
        router.bind(continuous(src, 4, 40.0)).unwrap();

        let restores = router.unbind_owner(a);
        assert_eq!(restores, vec![(TargetRef::new(1), 10.0), (TargetRef::new(3), 30.0)]);
        assert_eq!(router.targets_of(src), vec![TargetRef::new(2), TargetRef::new(4)]);
        assert!(router.unbind_owner(a).is_empty());
    }
}
