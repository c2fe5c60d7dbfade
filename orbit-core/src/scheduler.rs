//! Deferred note-offs.
//!
//! Every note the engine starts gets a pending note-off here, tagged with the
//! component that started it so teardown can flush exactly its notes.

use orbit_types::SequencerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteOwner {
    /// Direct step notes
    Sequencer(SequencerId),
    /// Notes from the sequencer's arpeggiator
    Arpeggiator(SequencerId),
}

impl NoteOwner {
    pub fn sequencer(&self) -> SequencerId {
        match self {
            NoteOwner::Sequencer(id) | NoteOwner::Arpeggiator(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingNoteOff {
    pub id: TimerId,
    pub due: f64,
    pub owner: NoteOwner,
    pub channel: u8,
    pub pitch: u8,
}

#[derive(Debug, Clone, Default)]
pub struct NoteScheduler {
    pending: Vec<PendingNoteOff>,
    next_id: u64,
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, owner: NoteOwner, channel: u8, pitch: u8, due: f64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingNoteOff {
            id,
            due,
            owner,
            channel,
            pitch,
        });
        id
    }

    /// Remove and return note-offs for a note that is about to be restarted.
    pub fn take_matching(&mut self, channel: u8, pitch: u8) -> Vec<PendingNoteOff> {
        self.drain_where(|p| p.channel == channel && p.pitch == pitch)
    }

    /// Remove and return every note-off due at or before `now`, earliest first.
    pub fn due(&mut self, now: f64) -> Vec<PendingNoteOff> {
        let mut due = self.drain_where(|p| p.due <= now);
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due
    }

    pub fn flush_owner(&mut self, owner: NoteOwner) -> Vec<PendingNoteOff> {
        self.drain_where(|p| p.owner == owner)
    }

    /// Both the direct and the arpeggiated notes of one sequencer.
    pub fn flush_sequencer(&mut self, sequencer: SequencerId) -> Vec<PendingNoteOff> {
        self.drain_where(|p| p.owner.sequencer() == sequencer)
    }

    pub fn flush_all(&mut self) -> Vec<PendingNoteOff> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[PendingNoteOff] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn drain_where(&mut self, pred: impl Fn(&PendingNoteOff) -> bool) -> Vec<PendingNoteOff> {
        let (taken, kept): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| pred(p));
        self.pending = kept;
        taken
    }
}
