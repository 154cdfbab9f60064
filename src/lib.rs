//! Control core for a two-knob, one-button Turing-style CV sequencer.
//!
//! [`Controller`] owns all state and is driven one loop iteration at a time
//! with raw [`Readings`]; time and randomness are injected so the whole machine
//! runs deterministically under test.

pub mod clock;
pub mod controller;
pub mod encoder;
pub mod input;
pub mod mode;
pub mod scale;
pub mod sequencer;
pub mod timebase;

pub use clock::{ClockMode, ClockSource};
pub use controller::{Controller, Readings, Settings, Snapshot, StepEvent};
pub use encoder::NoteEncoder;
pub use input::{ButtonState, Controls, InputSampler};
pub use mode::{Mode, UiStateMachine};
pub use scale::Scale;
pub use sequencer::{FixedDraws, NoteRng, StepSequencer, MAX_STEPS};
pub use timebase::{ManualTimebase, MonotonicTimebase, Timebase};
