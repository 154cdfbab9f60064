use crate::clock::{ClockMode, ClockSource, MAX_TEMPO, MIN_TEMPO};
use crate::input::Controls;
use crate::sequencer::{NoteRng, StepSequencer, MAX_ROOT, MAX_STEPS};

/// knob0 above this keeps re-rolling the note under the cursor.
pub const DEFAULT_RANDOM_THRESHOLD: u8 = 150;

/// knob0 at full clockwise selects the external clock in setup mode.
pub const EXTERNAL_CLOCK_KNOB: u8 = 255;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Knobs play the sequence: length, randomness, root while held.
    #[default]
    Performance,
    /// knob0 sets tempo, or external clock when fully clockwise.
    Setup,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Performance => Self::Setup,
            Self::Setup       => Self::Performance,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Performance => "Performance",
            Self::Setup       => "Setup",
        }
    }
}

/// Linear map of `x` from one range onto another, clamped to the output range.
pub fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let mapped = out_min + (x - in_min) * (out_max - out_min) / (in_max - in_min);
    let (lo, hi) = if out_min <= out_max { (out_min, out_max) } else { (out_max, out_min) };
    mapped.clamp(lo, hi)
}

// ── UI state machine ──────────────────────────────────────────────────────────

pub struct UiStateMachine {
    pub mode:             Mode,
    pub random_threshold: u8,
}

impl UiStateMachine {
    pub fn new(random_threshold: u8) -> Self {
        Self { mode: Mode::Performance, random_threshold }
    }

    /// Whether the current controls are re-rolling notes.
    pub fn randomizing(&self, controls: &Controls) -> bool {
        self.mode == Mode::Performance && controls.knob0 > self.random_threshold
    }

    /// Apply one sample of controls to the sequencer and clock.
    pub fn update(
        &mut self,
        controls: &Controls,
        seq:      &mut StepSequencer,
        clock:    &mut ClockSource,
        rng:      &mut impl NoteRng,
    ) {
        let b = controls.button;

        // Tap = accepted release that never became a hold.
        if b.changed && !b.held && !b.pressed {
            self.mode = self.mode.toggled();
            log::info!(target: "ui", "mode -> {}", self.mode.name());
        }

        match self.mode {
            Mode::Performance => {
                if b.held {
                    let root = map_range(controls.knob0 as f32, 0.0, 255.0, 0.0, MAX_ROOT as f32);
                    seq.set_root(root as u8);
                } else if !b.pressed {
                    let len = map_range(controls.knob1 as f32, 0.0, 255.0, 1.0, MAX_STEPS as f32);
                    seq.set_length(len as usize);
                }

                if controls.knob0 > self.random_threshold {
                    seq.randomize_current(rng);
                }
            }
            Mode::Setup => {
                let prev = clock.mode();
                if controls.knob0 >= EXTERNAL_CLOCK_KNOB {
                    clock.set_mode(ClockMode::External);
                } else {
                    clock.set_mode(ClockMode::Internal);
                    let span = MAX_TEMPO - MIN_TEMPO;
                    clock.set_tempo(MIN_TEMPO + map_range(controls.knob0 as f32, 0.0, 255.0, 0.0, span));
                }
                if clock.mode() != prev {
                    log::info!(target: "ui", "clock -> {}", clock.mode().name());
                }
            }
        }
    }
}

impl Default for UiStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_RANDOM_THRESHOLD)
    }
}
