use rand::rngs::StdRng;
use rand::Rng;

use crate::scale::Scale;

/// Number of note slots in the buffer.
pub const MAX_STEPS: usize = 8;

/// Highest root note (B above C).
pub const MAX_ROOT: u8 = 11;

// ── Random draw capability ────────────────────────────────────────────────────

/// Draws the index used to pick a note out of a scale.
pub trait NoteRng {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl NoteRng for StdRng {
    fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Replays a fixed list of draws, cycling when exhausted. Each draw is reduced
/// modulo the scale length so it can never index out of the table.
#[derive(Clone, Debug)]
pub struct FixedDraws {
    draws: Vec<usize>,
    pos:   usize,
}

impl FixedDraws {
    pub fn new(draws: impl Into<Vec<usize>>) -> Self {
        Self { draws: draws.into(), pos: 0 }
    }
}

impl NoteRng for FixedDraws {
    fn pick(&mut self, len: usize) -> usize {
        if self.draws.is_empty() { return 0; }
        let d = self.draws[self.pos % self.draws.len()];
        self.pos = (self.pos + 1) % self.draws.len();
        d % len
    }
}

// ── Step sequencer ────────────────────────────────────────────────────────────

/// Fixed-capacity note buffer with a play cursor.
///
/// Stored values are scale offsets; the root note is added at output time.
/// `cursor < length` holds after every public call.
pub struct StepSequencer {
    notes:  [u8; MAX_STEPS],
    length: usize,
    cursor: usize,
    scale:  Scale,
    root:   u8,
}

impl StepSequencer {
    pub fn new(scale: Scale) -> Self {
        Self {
            notes:  [0; MAX_STEPS],
            length: MAX_STEPS,
            cursor: 0,
            scale,
            root:   0,
        }
    }

    pub fn notes(&self) -> &[u8; MAX_STEPS] { &self.notes }

    /// The leading slots that are actually played.
    pub fn active_notes(&self) -> &[u8] { &self.notes[..self.length] }

    pub fn length(&self) -> usize { self.length }

    pub fn cursor(&self) -> usize { self.cursor }

    pub fn scale(&self) -> Scale { self.scale }

    pub fn root(&self) -> u8 { self.root }

    pub fn set_root(&mut self, root: u8) {
        self.root = root.min(MAX_ROOT);
    }

    pub fn current_note(&self) -> u8 {
        self.notes[self.cursor]
    }

    /// Step the cursor. Call once per accepted tick, after the note went out.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.length;
    }

    pub fn random_note_in_scale(&self, rng: &mut impl NoteRng) -> u8 {
        let offsets = self.scale.offsets();
        let idx = rng.pick(offsets.len()).min(offsets.len() - 1);
        offsets[idx]
    }

    /// Fill every slot, including the ones beyond the active length.
    pub fn refill_all(&mut self, rng: &mut impl NoteRng) {
        for i in 0..MAX_STEPS {
            self.notes[i] = self.random_note_in_scale(rng);
        }
    }

    /// Overwrite the slot under the cursor with a fresh note.
    pub fn randomize_current(&mut self, rng: &mut impl NoteRng) {
        let note = self.random_note_in_scale(rng);
        self.notes[self.cursor] = note;
    }

    /// Clamp to `1..=MAX_STEPS`; the cursor wraps into the new range.
    pub fn set_length(&mut self, len: usize) {
        self.length = len.clamp(1, MAX_STEPS);
        if self.cursor >= self.length { self.cursor %= self.length; }
    }

    /// Store `offset` in slot `step`. Offsets outside the active scale and
    /// steps past the buffer are rejected and the slot is left alone.
    pub fn set_note(&mut self, step: usize, offset: u8) -> bool {
        if step >= MAX_STEPS || !self.scale.contains(offset) {
            log::warn!(target: "sequencer",
                "rejecting note {} for step {} (scale {})", offset, step, self.scale.name());
            return false;
        }
        self.notes[step] = offset;
        true
    }

    /// Switch scale by table index. Out-of-table indices are rejected and the
    /// current scale stays. Existing notes are left alone.
    pub fn set_scale_index(&mut self, idx: usize) -> bool {
        match Scale::from_index(idx) {
            Some(scale) => {
                self.scale = scale;
                true
            }
            None => {
                log::warn!(target: "sequencer",
                    "scale index {} outside table of {}, keeping {}",
                    idx, Scale::ALL.len(), self.scale.name());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn refill_draws_every_slot_from_scale() {
        let mut seq = StepSequencer::new(Scale::Blues);
        seq.set_length(3);
        let mut rng = FixedDraws::new(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        seq.refill_all(&mut rng);
        assert_eq!(seq.notes(), &[0, 3, 5, 6, 7, 10, 0, 3]);
    }

    #[test]
    fn seeded_refill_stays_in_scale() {
        let mut rng = StdRng::seed_from_u64(7);
        for scale in Scale::ALL {
            let mut seq = StepSequencer::new(scale);
            seq.refill_all(&mut rng);
            assert!(seq.notes().iter().all(|&n| scale.contains(n)));
        }
    }

    #[test]
    fn advance_wraps_at_active_length() {
        let mut seq = StepSequencer::new(Scale::Minor);
        seq.set_length(3);
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(seq.cursor());
            seq.advance();
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn shrinking_length_wraps_cursor() {
        let mut seq = StepSequencer::new(Scale::Minor);
        for _ in 0..6 { seq.advance(); }
        assert_eq!(seq.cursor(), 6);
        seq.set_length(4);
        assert_eq!(seq.cursor(), 2);
        seq.advance();
        assert_eq!(seq.cursor(), 3);
        seq.advance();
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn length_is_clamped() {
        let mut seq = StepSequencer::new(Scale::Minor);
        seq.set_length(0);
        assert_eq!(seq.length(), 1);
        seq.set_length(42);
        assert_eq!(seq.length(), MAX_STEPS);
    }

    #[test]
    fn cursor_bounds_hold_under_random_lengths() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut seq = StepSequencer::new(Scale::Minor);
        for _ in 0..500 {
            if rng.gen_bool(0.3) { seq.set_length(rng.gen_range(0..=10)); }
            seq.advance();
            assert!(seq.cursor() < seq.length());
            assert!(seq.length() <= MAX_STEPS);
        }
    }

    #[test]
    fn randomize_current_only_touches_cursor_slot() {
        let mut seq = StepSequencer::new(Scale::DominantSeventh);
        seq.advance();
        let mut rng = FixedDraws::new(vec![3]);
        seq.randomize_current(&mut rng);
        assert_eq!(seq.notes(), &[0, 10, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn bad_scale_index_keeps_current() {
        let mut seq = StepSequencer::new(Scale::Blues);
        assert!(!seq.set_scale_index(9));
        assert_eq!(seq.scale(), Scale::Blues);
        assert!(seq.set_scale_index(4));
        assert_eq!(seq.scale(), Scale::Octave);
    }

    #[test]
    fn scale_change_leaves_stale_notes() {
        let mut seq = StepSequencer::new(Scale::Chromatic);
        seq.set_note(0, 1);
        seq.set_scale_index(Scale::Octave.index());
        assert_eq!(seq.current_note(), 1);
    }

    #[test]
    fn off_scale_note_is_rejected() {
        let mut seq = StepSequencer::new(Scale::Minor);
        seq.refill_all(&mut FixedDraws::new(vec![0]));
        assert!(!seq.set_note(0, 250));
        assert!(!seq.set_note(1, 1));
        assert!(!seq.set_note(MAX_STEPS, 3));
        assert_eq!(seq.notes(), &[0; MAX_STEPS]);
        assert!(seq.set_note(1, 3));
        assert_eq!(seq.notes()[1], 3);
    }

    #[test]
    fn root_is_clamped() {
        let mut seq = StepSequencer::new(Scale::Minor);
        seq.set_root(7);
        assert_eq!(seq.root(), 7);
        seq.set_root(30);
        assert_eq!(seq.root(), MAX_ROOT);
    }

    #[test]
    fn fixed_draws_cycle_and_reduce() {
        let mut rng = FixedDraws::new(vec![1, 9]);
        assert_eq!(rng.pick(4), 1);
        assert_eq!(rng.pick(4), 1);
        assert_eq!(rng.pick(4), 1);
    }
}
