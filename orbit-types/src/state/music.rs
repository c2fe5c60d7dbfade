use serde::{Deserialize, Serialize};

/// Scale definition as semitone offsets from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Major,
    Minor,
    Pentatonic,
    Chromatic,
    HarmonicMinor,
    Dorian,
    Phrygian,
    WholeTone,
    Diminished,
    Blues,
}

impl Scale {
    pub const ALL: [Scale; 10] = [
        Scale::Major,
        Scale::Minor,
        Scale::Pentatonic,
        Scale::Chromatic,
        Scale::HarmonicMinor,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::WholeTone,
        Scale::Diminished,
        Scale::Blues,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scale::Major => "Major",
            Scale::Minor => "Minor",
            Scale::Pentatonic => "Pentatonic",
            Scale::Chromatic => "Chromatic",
            Scale::HarmonicMinor => "Harmonic Minor",
            Scale::Dorian => "Dorian",
            Scale::Phrygian => "Phrygian",
            Scale::WholeTone => "Whole Tone",
            Scale::Diminished => "Diminished",
            Scale::Blues => "Blues",
        }
    }

    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Pentatonic => &[0, 2, 4, 7, 9],
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Scale::WholeTone => &[0, 2, 4, 6, 8, 10],
            Scale::Diminished => &[0, 1, 3, 4, 6, 7, 9, 10],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    /// Parse a scale name. Accepts the display name as well as the
    /// camelCase and kebab-case spellings used by presets.
    pub fn from_name(name: &str) -> Option<Scale> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "major" => Some(Scale::Major),
            "minor" => Some(Scale::Minor),
            "pentatonic" => Some(Scale::Pentatonic),
            "chromatic" => Some(Scale::Chromatic),
            "harmonicminor" => Some(Scale::HarmonicMinor),
            "dorian" => Some(Scale::Dorian),
            "phrygian" => Some(Scale::Phrygian),
            "wholetone" => Some(Scale::WholeTone),
            "diminished" => Some(Scale::Diminished),
            "blues" => Some(Scale::Blues),
            _ => None,
        }
    }

    pub fn next(&self) -> Scale {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Scale {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Chord shapes a triggering step can expand into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordType {
    Major,
    Minor,
    Diminished,
    Augmented,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    HalfDiminished7,
}

impl ChordType {
    pub const ALL: [ChordType; 9] = [
        ChordType::Major,
        ChordType::Minor,
        ChordType::Diminished,
        ChordType::Augmented,
        ChordType::Major7,
        ChordType::Minor7,
        ChordType::Dominant7,
        ChordType::Diminished7,
        ChordType::HalfDiminished7,
    ];

    /// Returns semitone offsets including the root (0).
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordType::Major => &[0, 4, 7],
            ChordType::Minor => &[0, 3, 7],
            ChordType::Diminished => &[0, 3, 6],
            ChordType::Augmented => &[0, 4, 8],
            ChordType::Major7 => &[0, 4, 7, 11],
            ChordType::Minor7 => &[0, 3, 7, 10],
            ChordType::Dominant7 => &[0, 4, 7, 10],
            ChordType::Diminished7 => &[0, 3, 6, 9],
            ChordType::HalfDiminished7 => &[0, 3, 6, 10],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChordType::Major => "Major",
            ChordType::Minor => "Minor",
            ChordType::Diminished => "dim",
            ChordType::Augmented => "aug",
            ChordType::Major7 => "maj7",
            ChordType::Minor7 => "m7",
            ChordType::Dominant7 => "7",
            ChordType::Diminished7 => "dim7",
            ChordType::HalfDiminished7 => "m7b5",
        }
    }

    pub fn next(&self) -> ChordType {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Expand a single MIDI pitch into chord pitches, dropping any that leave the MIDI range.
    pub fn expand(&self, root: u8) -> Vec<u8> {
        self.intervals()
            .iter()
            .filter_map(|&offset| {
                let pitch = root as u16 + offset as u16;
                if pitch <= 127 {
                    Some(pitch as u8)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_intervals_start_at_root() {
        for scale in Scale::ALL {
            assert_eq!(scale.intervals()[0], 0, "{} must start at the root", scale.name());
            assert!(scale.intervals().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn scale_from_name_spellings() {
        assert_eq!(Scale::from_name("harmonicMinor"), Some(Scale::HarmonicMinor));
        assert_eq!(Scale::from_name("whole-tone"), Some(Scale::WholeTone));
        assert_eq!(Scale::from_name("Whole Tone"), Some(Scale::WholeTone));
        assert_eq!(Scale::from_name("lydian"), None);
    }

    #[test]
    fn scale_cycle_round_trip() {
        let mut scale = Scale::Minor;
        for _ in 0..Scale::ALL.len() {
            scale = scale.next();
        }
        assert_eq!(scale, Scale::Minor);
        assert_eq!(Scale::Major.prev(), Scale::Blues);
    }

    #[test]
    fn chord_expand() {
        assert_eq!(ChordType::Major.expand(60), vec![60, 64, 67]);
        assert_eq!(ChordType::HalfDiminished7.expand(48), vec![48, 51, 54, 58]);
    }

    #[test]
    fn chord_expand_boundary() {
        // 124 + 4 and 124 + 7 leave the MIDI range
        assert_eq!(ChordType::Major.expand(124), vec![124]);
        assert_eq!(ChordType::Augmented.expand(127), vec![127]);
    }
}
