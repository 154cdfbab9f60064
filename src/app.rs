use std::collections::VecDeque;
use std::time::{Duration, Instant};

use turing_cv::{Controller, Readings, Snapshot, StepEvent};

use crate::audio::AudioEngine;

/// Without key-release events, the button lets go this long after the last
/// press/repeat of the key.
const FALLBACK_RELEASE_THRESHOLD: Duration = Duration::from_millis(600);

const KNOB_STEP: u8 = 8;
const HISTORY_LEN: usize = 16;

/// Expand an 8-bit knob position to the 16-bit reading the ADC would give.
fn to_raw(v: u8) -> u16 {
    (v as u16) << 8 | v as u16
}

// ── Simulated panel ───────────────────────────────────────────────────────────

pub struct App {
    pub controller:  Controller,
    pub knob0:       u8,
    pub knob1:       u8,
    pub button_down: bool,
    button_last_seen: Option<Instant>,
    /// knob1 can't go below this with the button up; the pull resistor holds it there.
    knob1_floor:     u8,
    clock_pulse:     bool,
    pub clock_level: bool,
    pub last_step:   Option<StepEvent>,
    pub history:     VecDeque<StepEvent>,
    pub snapshot:    Snapshot,
    pub status_msg:  String,
    audio:           Option<AudioEngine>,
}

impl App {
    pub fn new(controller: Controller, button_threshold: u8, audio: Option<AudioEngine>) -> Self {
        let snapshot = controller.snapshot();
        let knob1_floor = button_threshold.saturating_add(4);
        Self {
            controller,
            knob0:       0,
            knob1:       255,
            button_down: false,
            button_last_seen: None,
            knob1_floor,
            clock_pulse: false,
            clock_level: false,
            last_step:   None,
            history:     VecDeque::with_capacity(HISTORY_LEN),
            snapshot,
            status_msg:  String::new(),
            audio,
        }
    }

    pub fn audio_enabled(&self) -> bool { self.audio.is_some() }

    // ── Controller loop ───────────────────────────────────────────────────

    pub fn readings(&self) -> Readings {
        let knob1 = if self.button_down { 0 } else { self.knob1.max(self.knob1_floor) };
        Readings {
            knob0:      to_raw(self.knob0),
            knob1:      to_raw(knob1),
            clock_high: self.clock_level,
        }
    }

    /// One pass of the control loop. A pending clock pulse holds the line high
    /// for exactly this pass.
    pub fn step(&mut self) {
        self.clock_level = std::mem::take(&mut self.clock_pulse);
        let prev_mode = self.snapshot.mode;

        if let Some(ev) = self.controller.process(self.readings()) {
            if let Some(audio) = &self.audio { audio.play_cv(ev.cv); }
            if self.history.len() == HISTORY_LEN { self.history.pop_front(); }
            self.history.push_back(ev);
            self.last_step = Some(ev);
        }

        self.snapshot = self.controller.snapshot();
        if self.snapshot.mode != prev_mode {
            self.status_msg = format!("Mode: {}", self.snapshot.mode.name());
        }
    }

    // ── Knobs ─────────────────────────────────────────────────────────────

    pub fn knob0_up(&mut self)   { self.knob0 = self.knob0.saturating_add(KNOB_STEP); }
    pub fn knob0_down(&mut self) { self.knob0 = self.knob0.saturating_sub(KNOB_STEP); }
    pub fn knob0_max(&mut self)  { self.knob0 = u8::MAX; }
    pub fn knob0_min(&mut self)  { self.knob0 = 0; }

    pub fn knob1_up(&mut self)   { self.knob1 = self.knob1.saturating_add(KNOB_STEP); }

    pub fn knob1_down(&mut self) {
        self.knob1 = self.knob1.saturating_sub(KNOB_STEP).max(self.knob1_floor);
    }

    // ── Button ────────────────────────────────────────────────────────────

    pub fn button_press(&mut self) {
        self.button_down = true;
    }

    pub fn button_release(&mut self) {
        self.button_down = false;
        self.button_last_seen = None;
    }

    pub fn button_press_fallback(&mut self) {
        self.button_last_seen = Some(Instant::now());
        self.button_down = true;
    }

    pub fn tick_fallback_release(&mut self) {
        let stale = self.button_last_seen
            .map(|t| t.elapsed() >= FALLBACK_RELEASE_THRESHOLD)
            .unwrap_or(false);
        if stale { self.button_release(); }
    }

    // ── External clock ────────────────────────────────────────────────────

    pub fn clock_pulse(&mut self) {
        self.clock_pulse = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use turing_cv::{MonotonicTimebase, Settings};

    fn app() -> App {
        let c = Controller::new(Settings::default(), MonotonicTimebase::new(), StdRng::seed_from_u64(1));
        App::new(c, 4, None)
    }

    #[test]
    fn raw_expansion_covers_full_scale() {
        assert_eq!(to_raw(0), 0);
        assert_eq!(to_raw(255), u16::MAX);
        assert_eq!(to_raw(128) >> 8, 128);
    }

    #[test]
    fn button_pulls_knob1_low() {
        let mut a = app();
        assert_eq!(a.readings().knob1 >> 8, 255);
        a.button_press();
        assert_eq!(a.readings().knob1, 0);
        a.button_release();
        assert_eq!(a.readings().knob1 >> 8, 255);
    }

    #[test]
    fn knob1_never_reads_as_a_press() {
        let mut a = app();
        for _ in 0..100 { a.knob1_down(); }
        assert_eq!(a.knob1, 8);
        assert!(a.readings().knob1 >> 8 >= 4);
    }

    #[test]
    fn clock_pulse_lasts_one_step() {
        let mut a = app();
        a.clock_pulse();
        a.step();
        assert!(a.clock_level);
        a.step();
        assert!(!a.clock_level);
    }

    #[test]
    fn fallback_release_waits_for_threshold() {
        let mut a = app();
        a.button_press_fallback();
        a.tick_fallback_release();
        assert!(a.button_down);
    }
}
