// Converting notes to DAC codes:
//
// The output is a 16-bit code space over 3.3 V full scale. 1 V/octave puts one
// volt at (1.0 / 3.3) * 65536 ≈ 19859 counts; the hardware was calibrated to
// 19840, i.e. 1653.33 counts per semitone.

pub const DEFAULT_COUNTS_PER_OCTAVE: u32 = 19_840;
pub const DEFAULT_MAX_CODE: u16 = u16::MAX;

/// Full-scale output voltage the code space maps onto.
pub const FULL_SCALE_VOLTS: f32 = 3.3;

/// Maps absolute note numbers onto output codes. Codes past `max_code`
/// saturate there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEncoder {
    pub counts_per_octave: u32,
    pub max_code:          u16,
}

impl NoteEncoder {
    pub fn new(counts_per_octave: u32, max_code: u16) -> Self {
        Self { counts_per_octave, max_code }
    }

    pub fn counts_per_semitone(&self) -> f32 {
        self.counts_per_octave as f32 / 12.0
    }

    pub fn encode_absolute(&self, note: u32) -> u16 {
        let code = note as u64 * self.counts_per_octave as u64 / 12;
        code.min(self.max_code as u64) as u16
    }

    /// `root + offset`, scaled and truncated.
    pub fn encode(&self, root: u8, offset: u8) -> u16 {
        self.encode_absolute(root as u32 + offset as u32)
    }

    /// Voltage a code produces at the output, for monitoring.
    pub fn code_to_volts(code: u16) -> f32 {
        code as f32 / 65_536.0 * FULL_SCALE_VOLTS
    }
}

impl Default for NoteEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTS_PER_OCTAVE, DEFAULT_MAX_CODE)
    }
}
