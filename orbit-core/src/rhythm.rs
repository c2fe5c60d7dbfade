//! Euclidean rhythm generation.
//!
//! Bjorklund's algorithm in its counts/remainders form: repeatedly divide the
//! rests among the pulses until the remainder converges, then expand the
//! recorded counts back into a flat pattern.

/// Distribute `pulses` onsets as evenly as possible over `slots` positions.
///
/// `pulses` is clamped to `slots`. Returns an empty pattern for `slots == 0`;
/// callers validate slot counts before getting here.
pub fn generate(pulses: usize, slots: usize) -> Vec<bool> {
    if slots == 0 {
        return Vec::new();
    }
    let pulses = pulses.min(slots);
    if pulses == 0 {
        return vec![false; slots];
    }
    if pulses == slots {
        return vec![true; slots];
    }

    let mut counts: Vec<usize> = Vec::new();
    let mut remainders: Vec<usize> = vec![pulses];
    let mut divisor = slots - pulses;
    let mut level = 0;
    loop {
        counts.push(divisor / remainders[level]);
        remainders.push(divisor % remainders[level]);
        divisor = remainders[level];
        level += 1;
        if remainders[level] <= 1 {
            break;
        }
    }
    counts.push(divisor);

    let mut pattern = Vec::with_capacity(slots);
    build(level as isize, &counts, &remainders, &mut pattern);
    pattern.reverse();
    pattern
}

/// [`generate`], rotated right by `rotation` slots.
pub fn generate_rotated(pulses: usize, slots: usize, rotation: usize) -> Vec<bool> {
    let mut pattern = generate(pulses, slots);
    if !pattern.is_empty() {
        let len = pattern.len();
        pattern.rotate_right(rotation % len);
    }
    pattern
}

fn build(level: isize, counts: &[usize], remainders: &[usize], out: &mut Vec<bool>) {
    match level {
        -1 => out.push(false),
        -2 => out.push(true),
        _ => {
            let l = level as usize;
            for _ in 0..counts[l] {
                build(level - 1, counts, remainders, out);
            }
            if remainders[l] != 0 {
                build(level - 2, counts, remainders, out);
            }
        }
    }
}
