use orbit_core::sequencer::StepSequencer;

/// One row per sequencer: pulses as `x`, rests as `.`, the playhead in brackets.
pub fn pattern_row(seq: &StepSequencer) -> String {
    let current = seq.current_index();
    let cells: String = seq
        .pattern()
        .iter()
        .enumerate()
        .map(|(i, &pulse)| {
            let c = if pulse { 'x' } else { '.' };
            if i == current {
                format!("[{}]", c)
            } else {
                format!(" {} ", c)
            }
        })
        .collect();
    let state = seq.state();
    let status = if state.playing { "" } else { " (stopped)" };
    format!(
        "{:>8} {:<10}{}{}",
        state.name,
        state.stepping_mode.name(),
        cells,
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_types::{SequencerId, SequencerState};

    #[test]
    fn playhead_is_bracketed() {
        let mut state = SequencerState::new(SequencerId::new(0));
        state.name = "lead".to_string();
        state.slot_count = 4;
        state.pulse_count = 1;
        let seq = StepSequencer::new(state).unwrap();
        let row = pattern_row(&seq);
        assert!(row.contains("[x] .  .  . "));
        assert!(row.trim_start().starts_with("lead"));
    }
}
