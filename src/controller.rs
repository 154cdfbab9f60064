use rand::rngs::StdRng;

use crate::clock::{ClockMode, ClockSource};
use crate::encoder::NoteEncoder;
use crate::input::{Controls, InputSampler, DEFAULT_BUTTON_THRESHOLD};
use crate::mode::{Mode, UiStateMachine, DEFAULT_RANDOM_THRESHOLD};
use crate::scale::Scale;
use crate::sequencer::{NoteRng, StepSequencer};
use crate::timebase::{MonotonicTimebase, Timebase};

/// Raw hardware readings for one loop iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Readings {
    /// 16-bit analog reading of knob0.
    pub knob0: u16,
    /// 16-bit analog reading of knob1, which the button pulls to ground.
    pub knob1: u16,
    /// Level of the external clock input.
    pub clock_high: bool,
}

/// A note emitted on an accepted tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepEvent {
    /// Slot that was played.
    pub step:   usize,
    /// Scale offset stored in the slot.
    pub offset: u8,
    /// Root + offset.
    pub note:   u8,
    /// Output code written to the DAC.
    pub cv:     u16,
}

/// Everything a renderer needs, copied out once per iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub mode:        Mode,
    pub cursor:      usize,
    pub length:      usize,
    pub notes:       Vec<u8>,
    pub root:        u8,
    pub held:        bool,
    pub knob0:       u8,
    pub randomizing: bool,
    pub clock_mode:  ClockMode,
    pub tempo:       f32,
    pub scale:       Scale,
}

/// Construction-time parameters for a controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub button_threshold: u8,
    pub random_threshold: u8,
    pub encoder:          NoteEncoder,
    pub scale:            usize,
    pub clock_mode:       ClockMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            button_threshold: DEFAULT_BUTTON_THRESHOLD,
            random_threshold: DEFAULT_RANDOM_THRESHOLD,
            encoder:          NoteEncoder::default(),
            scale:            0,
            clock_mode:       ClockMode::Internal,
        }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Owns every piece of sequencer state. One `process` call is one pass of the
/// control loop: sample, apply UI, decide the tick, emit and advance.
pub struct Controller<T: Timebase = MonotonicTimebase, R: NoteRng = StdRng> {
    time:     T,
    rng:      R,
    input:    InputSampler,
    ui:       UiStateMachine,
    seq:      StepSequencer,
    clock:    ClockSource,
    encoder:  NoteEncoder,
    controls: Controls,
}

impl<T: Timebase, R: NoteRng> Controller<T, R> {
    pub fn new(settings: Settings, time: T, mut rng: R) -> Self {
        let mut seq = StepSequencer::new(Scale::default());
        seq.set_scale_index(settings.scale);
        seq.refill_all(&mut rng);

        let clock = ClockSource::new(settings.clock_mode);
        log::info!(target: "controller", "machine is online. clock: {} scale: {} notes: {:?}",
            clock.mode().name(), seq.scale().name(), seq.notes());

        Self {
            time,
            rng,
            input:    InputSampler::new(settings.button_threshold),
            ui:       UiStateMachine::new(settings.random_threshold),
            seq,
            clock,
            encoder:  settings.encoder,
            controls: Controls::default(),
        }
    }

    /// Run one loop iteration. Returns the emitted note when a tick fired.
    pub fn process(&mut self, readings: Readings) -> Option<StepEvent> {
        let now = self.time.now();
        self.controls = self.input.sample(readings.knob0, readings.knob1, now);
        self.ui.update(&self.controls, &mut self.seq, &mut self.clock, &mut self.rng);

        if !self.clock.poll(now, readings.clock_high) {
            return None;
        }

        let step   = self.seq.cursor();
        let offset = self.seq.current_note();
        let note   = self.seq.root().saturating_add(offset);
        let cv     = self.encoder.encode(self.seq.root(), offset);
        let event  = StepEvent { step, offset, note, cv };

        let b = self.controls.button;
        log::debug!(target: "controller",
            "t:{:.1} mode:{}{} len:{:2} i:{:2} note:{:2} cv:{:5} k0:{:3} k1:{:3} b:{} bh:{}",
            self.clock.tempo(), self.ui.mode.name(), self.clock.mode().name(),
            self.seq.length(), step, note, cv,
            self.controls.knob0, self.controls.knob1, b.pressed, b.held);

        self.seq.advance();
        Some(event)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode:        self.ui.mode,
            cursor:      self.seq.cursor(),
            length:      self.seq.length(),
            notes:       self.seq.active_notes().to_vec(),
            root:        self.seq.root(),
            held:        self.controls.button.held,
            knob0:       self.controls.knob0,
            randomizing: self.ui.randomizing(&self.controls),
            clock_mode:  self.clock.mode(),
            tempo:       self.clock.tempo(),
            scale:       self.seq.scale(),
        }
    }

    pub fn mode(&self) -> Mode { self.ui.mode }

    pub fn controls(&self) -> Controls { self.controls }

    pub fn sequencer(&self) -> &StepSequencer { &self.seq }

    pub fn sequencer_mut(&mut self) -> &mut StepSequencer { &mut self.seq }

    pub fn clock(&self) -> &ClockSource { &self.clock }

    pub fn clock_mut(&mut self) -> &mut ClockSource { &mut self.clock }

    pub fn encoder(&self) -> NoteEncoder { self.encoder }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::FixedDraws;
    use crate::timebase::ManualTimebase;

    const KNOB_MID: u16 = 128 << 8;

    fn controller(draws: Vec<usize>) -> (Controller<ManualTimebase, FixedDraws>, ManualTimebase) {
        let tb = ManualTimebase::new();
        let c = Controller::new(Settings::default(), tb.clone(), FixedDraws::new(draws));
        (c, tb)
    }

    fn idle() -> Readings {
        Readings { knob0: 0, knob1: KNOB_MID, clock_high: false }
    }

    #[test]
    fn startup_fills_buffer_from_draws() {
        let (c, _) = controller(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(c.sequencer().notes(), &[0, 2, 3, 5, 7, 8, 10, 12]);
        assert_eq!(c.mode(), Mode::Performance);
        assert_eq!(c.clock().mode(), ClockMode::Internal);
    }

    #[test]
    fn invalid_scale_falls_back_to_default() {
        let settings = Settings { scale: 17, ..Settings::default() };
        let c = Controller::new(settings, ManualTimebase::new(), FixedDraws::new(vec![1]));
        assert_eq!(c.sequencer().scale(), Scale::Minor);
    }

    #[test]
    fn configured_scale_is_used_for_fill() {
        let settings = Settings { scale: 4, ..Settings::default() };
        let c = Controller::new(settings, ManualTimebase::new(), FixedDraws::new(vec![1]));
        assert_eq!(c.sequencer().notes(), &[12; 8]);
    }

    #[test]
    fn no_tick_before_step_length() {
        let (mut c, tb) = controller(vec![0]);
        tb.set_secs(0.3);
        assert_eq!(c.process(idle()), None);
    }

    #[test]
    fn tick_emits_then_advances() {
        let (mut c, tb) = controller(vec![1]);
        tb.set_secs(0.6);
        let ev = c.process(idle()).expect("tick");
        assert_eq!(ev.step, 0);
        assert_eq!(ev.offset, 2);
        assert_eq!(ev.note, 2);
        assert_eq!(ev.cv, c.encoder().encode(0, 2));
        assert_eq!(c.sequencer().cursor(), 1);
    }

    #[test]
    fn root_is_added_at_output() {
        let (mut c, tb) = controller(vec![2]);
        c.sequencer_mut().set_root(4);
        tb.set_secs(0.6);
        let ev = c.process(idle()).expect("tick");
        assert_eq!(ev.offset, 3);
        assert_eq!(ev.note, 7);
        assert_eq!(c.sequencer().notes()[0], 3);
    }

    #[test]
    fn off_scale_write_cannot_reach_output() {
        let (mut c, tb) = controller(vec![0]);
        c.sequencer_mut().set_root(11);
        assert!(!c.sequencer_mut().set_note(0, 250));
        tb.set_secs(0.6);
        let ev = c.process(idle()).expect("tick");
        assert_eq!(ev.offset, 0);
        assert_eq!(ev.note, 11);
        assert_eq!(ev.cv, c.encoder().encode(11, 0));
    }

    #[test]
    fn snapshot_reflects_active_slice() {
        let (mut c, tb) = controller(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        tb.set_secs(0.01);
        c.process(Readings { knob0: 200 << 8, knob1: 0x4000, clock_high: false });
        let snap = c.snapshot();
        assert_eq!(snap.length, 2);
        assert_eq!(snap.notes.len(), 2);
        assert_eq!(snap.knob0, 200);
        assert!(snap.randomizing);
        assert!(!snap.held);
        assert_eq!(snap.tempo, 120.0);
    }
}
