mod common;

use common::{dense_state, run, Clock, NoteEvent, RecordingSink};
use orbit_core::Engine;
use orbit_types::{
    ArpAction, ArpDivision, ArpPattern, EngineCommand, SequencerAction, SteppingMode,
};

#[test]
fn test_removing_a_sequencer_silences_it() {
    let mut engine = Engine::new(120.0, Some(2));
    let mut sink = RecordingSink::default();
    let mut clock = Clock::default();
    let mut state = dense_state(8, SteppingMode::Forward);
    state.midi_channel = 3;
    let id = engine.add_sequencer_with(state).unwrap();
    engine.set_note_length(10.0).unwrap();

    engine.start(clock.now());
    run(&mut engine, &mut clock, &mut sink, 60);
    assert_eq!(sink.note_ons(), 1);
    assert_eq!(sink.hanging(), vec![(3, 62)]);

    engine.queue(EngineCommand::RemoveSequencer(id));
    run(&mut engine, &mut clock, &mut sink, 1);
    assert!(sink.hanging().is_empty());
    assert!(engine.scheduler().is_empty());
    assert!(engine.sequencer(id).is_none());
}

#[test]
fn test_restarted_note_is_not_cut_short() {
    let mut engine = Engine::new(120.0, Some(2));
    let mut sink = RecordingSink::default();
    let mut clock = Clock::default();
    // one slot, so the same pitch fires every beat
    let mut state = dense_state(1, SteppingMode::Forward);
    state.midi_channel = 0;
    engine.add_sequencer_with(state).unwrap();
    engine.set_note_length(2.0).unwrap();

    engine.start(clock.now());
    run(&mut engine, &mut clock, &mut sink, 120);

    // every retrigger is preceded by the previous note's off
    assert_eq!(
        sink.events,
        vec![
            NoteEvent::On { channel: 0, pitch: 60, velocity: 100 },
            NoteEvent::Off { channel: 0, pitch: 60 },
            NoteEvent::On { channel: 0, pitch: 60, velocity: 100 },
        ]
    );
    assert_eq!(engine.scheduler().len(), 1);
}

#[test]
fn test_busy_session_leaves_no_hanging_notes() {
    let mut engine = Engine::new(180.0, Some(99));
    let mut sink = RecordingSink::default();
    let mut clock = Clock::default();

    let modes = [
        SteppingMode::Random,
        SteppingMode::Brownian,
        SteppingMode::Pendulum,
        SteppingMode::Fibonacci,
    ];
    let mut ids = Vec::new();
    for (i, mode) in modes.into_iter().enumerate() {
        let mut state = dense_state(5 + i * 3, mode);
        state.pulse_count = 3 + i;
        state.probability = 70;
        state.chord_enabled = i % 2 == 0;
        state.midi_channel = i as u8;
        ids.push(engine.add_sequencer_with(state).unwrap());
    }
    for (id, pattern) in ids.iter().zip([ArpPattern::UpDown, ArpPattern::Random]) {
        engine.queue(EngineCommand::Arpeggiator(*id, ArpAction::SetEnabled(true)));
        engine.queue(EngineCommand::Arpeggiator(*id, ArpAction::SetPattern(pattern)));
        engine.queue(EngineCommand::Arpeggiator(
            *id,
            ArpAction::SetDivision(ArpDivision::Eighth),
        ));
    }

    engine.start(clock.now());
    run(&mut engine, &mut clock, &mut sink, 600);

    // edits while playing
    engine.queue(EngineCommand::Arpeggiator(ids[0], ArpAction::Toggle));
    engine.queue(EngineCommand::Sequencer(ids[1], SequencerAction::SetMidiChannel(9)));
    engine.queue(EngineCommand::Sequencer(ids[2], SequencerAction::SetSlotCount(3)));
    run(&mut engine, &mut clock, &mut sink, 600);

    engine.queue(EngineCommand::RemoveSequencer(ids[3]));
    engine.queue(EngineCommand::AddSequencer);
    run(&mut engine, &mut clock, &mut sink, 600);

    assert!(sink.note_ons() > 20);
    engine.stop(&mut sink);
    assert!(sink.hanging().is_empty(), "hanging: {:?}", sink.hanging());
    assert_eq!(sink.note_ons(), sink.note_offs());
}

#[test]
fn test_panic_turns_everything_off() {
    let mut engine = Engine::new(120.0, Some(4));
    let mut sink = RecordingSink::default();
    let mut clock = Clock::default();
    engine
        .add_sequencer_with(dense_state(4, SteppingMode::Forward))
        .unwrap();
    engine.set_note_length(60.0).unwrap();
    engine.start(clock.now());
    run(&mut engine, &mut clock, &mut sink, 240);
    assert!(!sink.hanging().is_empty());

    engine.panic(&mut sink);
    assert!(sink.hanging().is_empty());
    assert!(engine.scheduler().is_empty());
}
