// ── Scale table ───────────────────────────────────────────────────────────────

/// Built-in pitch-class scales. Offsets are semitones above the root and may
/// reach 12 (the octave) where the table asks for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scale {
    Minor,
    Blues,
    DominantSeventh,
    Chromatic,
    Octave,
}

impl Scale {
    pub const ALL: [Scale; 5] = [
        Scale::Minor,
        Scale::Blues,
        Scale::DominantSeventh,
        Scale::Chromatic,
        Scale::Octave,
    ];

    pub fn from_index(idx: usize) -> Option<Scale> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Self::Minor => 0, Self::Blues => 1, Self::DominantSeventh => 2,
            Self::Chromatic => 3, Self::Octave => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Minor           => "Minor",
            Self::Blues           => "Blues",
            Self::DominantSeventh => "Dom7",
            Self::Chromatic       => "Chromatic",
            Self::Octave          => "Octave",
        }
    }

    pub fn offsets(self) -> &'static [u8] {
        match self {
            Self::Minor           => &[0, 2, 3, 5, 7, 8, 10, 12],
            Self::Blues           => &[0, 3, 5, 6, 7, 10],
            Self::DominantSeventh => &[0, 4, 7, 10],
            Self::Chromatic       => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Self::Octave          => &[0, 12],
        }
    }

    pub fn contains(self, offset: u8) -> bool {
        self.offsets().contains(&offset)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Minor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_table() {
        for (i, scale) in Scale::ALL.iter().enumerate() {
            assert_eq!(scale.index(), i);
            assert_eq!(Scale::from_index(i), Some(*scale));
        }
        assert_eq!(Scale::from_index(Scale::ALL.len()), None);
    }

    #[test]
    fn default_is_first_entry() {
        assert_eq!(Scale::default(), Scale::ALL[0]);
        assert_eq!(Scale::default().offsets(), &[0, 2, 3, 5, 7, 8, 10, 12]);
    }

    #[test]
    fn offsets_stay_within_one_octave() {
        for scale in Scale::ALL {
            assert!(!scale.offsets().is_empty());
            assert!(scale.offsets().iter().all(|&o| o <= 12), "{}", scale.name());
        }
    }
}
