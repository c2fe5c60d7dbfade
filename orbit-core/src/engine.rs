//! The engine context: owns the transport, every sequencer and its
//! arpeggiator, the modulation router, pending note-offs and the RNG.
//!
//! A driver calls [`Engine::tick`] once per frame with the current time and a
//! note sink. Edits arrive as [`EngineCommand`]s, either applied immediately
//! with [`Engine::apply`] or queued with [`Engine::queue`] for the next tick.

use std::collections::{BTreeMap, VecDeque};

use orbit_types::{
    ArpeggiatorRecord, EngineCommand, EngineFeedback, ModSourceRecord, SequencerId,
    SequencerState, SessionSnapshot, TargetRef,
};

use crate::arpeggiator::Arpeggiator;
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::modulation::ModulationRouter;
use crate::output::NoteSink;
use crate::rng::Rng;
use crate::scheduler::{NoteOwner, NoteScheduler, PendingNoteOff};
use crate::sequencer::StepSequencer;
use crate::transport::{self, Transport};

pub const DEFAULT_NOTE_LENGTH: f64 = 0.1;

pub struct Engine {
    transport: Transport,
    /// Registration order is stepping order
    sequencers: Vec<StepSequencer>,
    arpeggiators: BTreeMap<SequencerId, Arpeggiator>,
    router: ModulationRouter,
    scheduler: NoteScheduler,
    rng: Rng,
    pending: VecDeque<EngineCommand>,
    next_sequencer_id: u32,
    /// Template for sequencers added without explicit settings
    sequencer_defaults: SequencerState,
    note_length: f64,
}

impl Engine {
    pub fn new(bpm: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Rng::new(seed),
            None => Rng::from_entropy(),
        };
        Self {
            transport: Transport::new(bpm),
            sequencers: Vec::new(),
            arpeggiators: BTreeMap::new(),
            router: ModulationRouter::new(),
            scheduler: NoteScheduler::new(),
            rng,
            pending: VecDeque::new(),
            next_sequencer_id: 0,
            sequencer_defaults: SequencerState::new(SequencerId::new(0)),
            note_length: DEFAULT_NOTE_LENGTH,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut engine = Self::new(config.bpm(), config.seed());
        engine.sequencer_defaults = config.sequencer_defaults(SequencerId::new(0));
        engine.note_length = config.note_length();
        engine
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn sequencers(&self) -> &[StepSequencer] {
        &self.sequencers
    }

    pub fn sequencer(&self, id: SequencerId) -> Option<&StepSequencer> {
        self.sequencers.iter().find(|s| s.id() == id)
    }

    pub fn arpeggiator(&self, id: SequencerId) -> Option<&Arpeggiator> {
        self.arpeggiators.get(&id)
    }

    pub fn router(&self) -> &ModulationRouter {
        &self.router
    }

    pub fn scheduler(&self) -> &NoteScheduler {
        &self.scheduler
    }

    pub fn note_length(&self) -> f64 {
        self.note_length
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
    }

    pub fn set_note_length(&mut self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(EngineError::InvalidParameter { name: "note_length", value: seconds });
        }
        self.note_length = seconds;
        Ok(())
    }

    // ---- sequencer lifecycle ----

    /// Add a sequencer with the configured defaults.
    pub fn add_sequencer(&mut self) -> Result<SequencerId> {
        let mut state = self.sequencer_defaults.clone();
        let id = SequencerId::new(self.next_sequencer_id);
        state.id = id;
        state.name = format!("Sequencer {}", id.get());
        state.midi_channel = (id.get() % 16) as u8;
        self.insert_sequencer(state)
    }

    /// Add a sequencer from explicit settings. The id is always assigned here.
    pub fn add_sequencer_with(&mut self, mut state: SequencerState) -> Result<SequencerId> {
        state.id = SequencerId::new(self.next_sequencer_id);
        self.insert_sequencer(state)
    }

    fn insert_sequencer(&mut self, state: SequencerState) -> Result<SequencerId> {
        let seq = StepSequencer::new(state)?;
        let id = seq.id();
        self.next_sequencer_id = self.next_sequencer_id.max(following_id(id)?);
        self.sequencers.push(seq);
        self.arpeggiators.insert(id, Arpeggiator::default());
        log::info!(target: "engine", "added sequencer {}", id);
        Ok(id)
    }

    /// Remove a sequencer and its arpeggiator, silencing any notes they left
    /// pending and detaching the modulation bindings it owns. Returns the
    /// restore values for those bindings' targets.
    pub fn remove_sequencer(
        &mut self,
        id: SequencerId,
        sink: &mut dyn NoteSink,
    ) -> Result<Vec<(TargetRef, f64)>> {
        let pos = self
            .sequencers
            .iter()
            .position(|s| s.id() == id)
            .ok_or(EngineError::UnknownSequencer(id))?;
        self.sequencers.remove(pos);
        self.arpeggiators.remove(&id);
        let flushed = self.scheduler.flush_sequencer(id);
        send_offs(sink, &flushed);
        let restores = self.router.unbind_owner(id);
        log::info!(
            target: "engine",
            "removed sequencer {} ({} notes flushed, {} bindings detached)",
            id,
            flushed.len(),
            restores.len()
        );
        Ok(restores)
    }

    // ---- commands ----

    /// Defer a command to the start of the next tick.
    pub fn queue(&mut self, command: EngineCommand) {
        self.pending.push_back(command);
    }

    pub fn queued(&self) -> usize {
        self.pending.len()
    }

    /// Apply a command now. `now` timestamps envelope and transport events.
    pub fn apply(
        &mut self,
        command: EngineCommand,
        now: f64,
        sink: &mut dyn NoteSink,
    ) -> Result<Vec<EngineFeedback>> {
        if command.is_structural() {
            log::info!(target: "engine", "apply {:?}", command);
        } else {
            log::debug!(target: "engine", "apply {:?}", command);
        }
        let mut feedback = Vec::new();
        match command {
            EngineCommand::AddSequencer => {
                let id = self.add_sequencer()?;
                feedback.push(EngineFeedback::SequencerAdded { sequencer: id });
            }
            EngineCommand::RemoveSequencer(id) => {
                for (target, value) in self.remove_sequencer(id, sink)? {
                    feedback.push(EngineFeedback::ParameterChanged { target, value });
                }
                feedback.push(EngineFeedback::SequencerRemoved { sequencer: id });
            }
            EngineCommand::Sequencer(id, action) => {
                let seq = self
                    .sequencers
                    .iter_mut()
                    .find(|s| s.id() == id)
                    .ok_or(EngineError::UnknownSequencer(id))?;
                seq.apply(&action)?;
            }
            EngineCommand::Arpeggiator(id, action) => {
                let arp = self
                    .arpeggiators
                    .get_mut(&id)
                    .ok_or(EngineError::UnknownSequencer(id))?;
                let was_enabled = arp.is_enabled();
                arp.apply(&action)?;
                if was_enabled && !arp.is_enabled() {
                    let flushed = self.scheduler.flush_owner(NoteOwner::Arpeggiator(id));
                    send_offs(sink, &flushed);
                }
            }
            EngineCommand::AddSource(config) => {
                let id = self.router.add_source(config)?;
                feedback.push(EngineFeedback::SourceAdded { source: id });
            }
            EngineCommand::RemoveSource(id) => {
                for (target, value) in self.router.remove_source(id)? {
                    feedback.push(EngineFeedback::ParameterChanged { target, value });
                }
                feedback.push(EngineFeedback::SourceRemoved { source: id });
            }
            EngineCommand::ConfigureSource(id, config) => {
                self.router.configure_source(id, config)?;
            }
            EngineCommand::Bind(binding) => {
                self.router.bind(binding)?;
            }
            EngineCommand::Unbind(target) => match self.router.unbind(target) {
                Some((target, value)) => {
                    feedback.push(EngineFeedback::ParameterChanged { target, value })
                }
                None => log::warn!(target: "modulation", "nothing bound to {}", target),
            },
            EngineCommand::TriggerEnvelope(id) => self.router.trigger_envelope(id, now)?,
            EngineCommand::ReleaseEnvelope(id) => self.router.release_envelope(id, now)?,
            EngineCommand::SetTempo(bpm) => self.transport.set_bpm(bpm)?,
            EngineCommand::Start => self.start(now),
            EngineCommand::Stop => self.stop(sink),
        }
        Ok(feedback)
    }

    // ---- transport ----

    /// Start the transport from `now` with every playhead back at the top.
    pub fn start(&mut self, now: f64) {
        for seq in &mut self.sequencers {
            seq.reset();
        }
        self.transport.start(now);
    }

    /// Stop the transport and silence everything still pending.
    pub fn stop(&mut self, sink: &mut dyn NoteSink) {
        self.transport.stop();
        let flushed = self.scheduler.flush_all();
        send_offs(sink, &flushed);
    }

    /// Note-off for every pending note, then for every pitch on every channel.
    pub fn panic(&mut self, sink: &mut dyn NoteSink) {
        let flushed = self.scheduler.flush_all();
        send_offs(sink, &flushed);
        for channel in 0..16u8 {
            for pitch in 0..128u8 {
                send_off(sink, channel, pitch);
            }
        }
        log::info!(target: "engine", "all notes off");
    }

    /// Run one frame.
    pub fn tick(&mut self, now: f64, sink: &mut dyn NoteSink) -> Vec<EngineFeedback> {
        let mut feedback = Vec::new();

        while let Some(command) = self.pending.pop_front() {
            match self.apply(command, now, sink) {
                Ok(mut fb) => feedback.append(&mut fb),
                Err(e) => log::warn!(target: "engine", "queued command rejected: {}", e),
            }
        }

        let due = self.scheduler.due(now);
        send_offs(sink, &due);

        if self.transport.tick(now) {
            self.step_sequencers(now, sink, &mut feedback);
        }

        if self.transport.is_running() {
            self.tick_arpeggiators(now, sink);
        }

        for (target, value) in self.router.tick(now, &mut self.rng) {
            feedback.push(EngineFeedback::ParameterChanged { target, value });
        }

        feedback
    }

    fn step_sequencers(
        &mut self,
        now: f64,
        sink: &mut dyn NoteSink,
        feedback: &mut Vec<EngineFeedback>,
    ) {
        let outcomes = transport::advance_all(&mut self.sequencers, &mut self.rng);
        for outcome in outcomes {
            feedback.push(EngineFeedback::StepAdvanced {
                sequencer: outcome.sequencer,
                index: outcome.index,
            });
            let Some(notes) = outcome.notes else {
                continue;
            };
            if notes.is_empty() {
                continue;
            }

            match self.arpeggiators.get_mut(&outcome.sequencer) {
                Some(arp) if arp.is_enabled() => {
                    arp.on_note_trigger(&notes, outcome.velocity, now);
                }
                _ => {
                    for &pitch in &notes {
                        self.play_note(
                            sink,
                            NoteOwner::Sequencer(outcome.sequencer),
                            outcome.channel,
                            pitch,
                            outcome.velocity,
                            now + self.note_length,
                        );
                    }
                }
            }
            feedback.push(EngineFeedback::NoteTriggered {
                sequencer: outcome.sequencer,
                notes,
            });
        }
    }

    fn tick_arpeggiators(&mut self, now: f64, sink: &mut dyn NoteSink) {
        let bpm = self.transport.bpm();
        let mut notes = Vec::new();
        for seq in &self.sequencers {
            if let Some(arp) = self.arpeggiators.get_mut(&seq.id()) {
                if let Some(note) = arp.tick(now, bpm, &mut self.rng) {
                    notes.push((seq.id(), seq.state().midi_channel, note));
                }
            }
        }
        for (id, channel, note) in notes {
            self.play_note(
                sink,
                NoteOwner::Arpeggiator(id),
                channel,
                note.pitch,
                note.velocity,
                now + note.gate,
            );
        }
    }

    /// Note-on now, note-off at `off_at`. A pending note-off for the same
    /// note is sent first so it cannot cut the new one short.
    fn play_note(
        &mut self,
        sink: &mut dyn NoteSink,
        owner: NoteOwner,
        channel: u8,
        pitch: u8,
        velocity: u8,
        off_at: f64,
    ) {
        let stale = self.scheduler.take_matching(channel, pitch);
        send_offs(sink, &stale);
        if let Err(e) = sink.note_on(channel, pitch, velocity) {
            log::warn!(target: "midi", "note on failed on {}: {}", sink.name(), e);
        }
        self.scheduler.schedule(owner, channel, pitch, off_at);
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            bpm: self.transport.bpm(),
            sequencers: self.sequencers.iter().map(|s| s.state().clone()).collect(),
            arpeggiators: self
                .sequencers
                .iter()
                .filter_map(|s| {
                    self.arpeggiators.get(&s.id()).map(|arp| ArpeggiatorRecord {
                        sequencer: s.id(),
                        config: arp.config().clone(),
                    })
                })
                .collect(),
            sources: self
                .router
                .sources()
                .map(|(id, source)| ModSourceRecord {
                    id,
                    config: source.config(),
                })
                .collect(),
            bindings: self.router.bindings().cloned().collect(),
        }
    }

    /// Replace the session. Everything is validated before anything changes;
    /// pending note-offs are kept so nothing is left hanging.
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> Result<()> {
        let mut transport = self.transport.clone();
        transport.set_bpm(snapshot.bpm)?;

        let mut sequencers: Vec<StepSequencer> = Vec::with_capacity(snapshot.sequencers.len());
        let mut next_sequencer_id = 0;
        for state in snapshot.sequencers {
            if sequencers.iter().any(|s| s.id() == state.id) {
                log::warn!(target: "engine", "duplicate sequencer {} in snapshot, skipping", state.id);
                continue;
            }
            next_sequencer_id = next_sequencer_id.max(following_id(state.id)?);
            sequencers.push(StepSequencer::new(state)?);
        }

        let mut arpeggiators: BTreeMap<SequencerId, Arpeggiator> = sequencers
            .iter()
            .map(|s| (s.id(), Arpeggiator::default()))
            .collect();
        for record in snapshot.arpeggiators {
            match arpeggiators.get_mut(&record.sequencer) {
                Some(slot) => *slot = Arpeggiator::new(record.config)?,
                None => log::warn!(
                    target: "engine",
                    "arpeggiator for unknown sequencer {} in snapshot",
                    record.sequencer
                ),
            }
        }

        let mut router = ModulationRouter::new();
        for source in snapshot.sources {
            router.insert_source(source)?;
        }
        for binding in snapshot.bindings {
            router.bind(binding)?;
        }

        self.next_sequencer_id = next_sequencer_id;
        self.transport = transport;
        self.sequencers = sequencers;
        self.arpeggiators = arpeggiators;
        self.router = router;
        log::info!(target: "engine", "restored session with {} sequencers", self.sequencers.len());
        Ok(())
    }
}

fn following_id(id: SequencerId) -> Result<u32> {
    id.get()
        .checked_add(1)
        .ok_or(EngineError::IdOverflow { kind: "sequencer", id: id.get() })
}

fn send_off(sink: &mut dyn NoteSink, channel: u8, pitch: u8) {
    if let Err(e) = sink.note_off(channel, pitch) {
        log::warn!(target: "midi", "note off failed on {}: {}", sink.name(), e);
    }
}

fn send_offs(sink: &mut dyn NoteSink, offs: &[PendingNoteOff]) {
    for off in offs {
        send_off(sink, off.channel, off.pitch);
    }
}
