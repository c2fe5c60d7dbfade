//! Step index to pitch mapping.

use orbit_types::Scale;

/// Build the pitch table for a sequencer.
///
/// Step `i` climbs the scale, wrapping into the next octave after each pass,
/// and falls back to the root octave after `octave_range` octaves. Pitches
/// above 127 are clamped.
pub fn generate(slot_count: usize, root_note: u8, scale: Scale, octave_range: u8) -> Vec<u8> {
    let intervals = scale.intervals();
    let octaves = octave_range.max(1) as usize;
    (0..slot_count)
        .map(|i| pitch_at(i, root_note, intervals, octaves))
        .collect()
}

fn pitch_at(step: usize, root_note: u8, intervals: &[u8], octaves: usize) -> u8 {
    let position = step % intervals.len();
    let octave = (step / intervals.len()) % octaves;
    let pitch = root_note as usize + intervals[position] as usize + 12 * octave;
    pitch.min(127) as u8
}
