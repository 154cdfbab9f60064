use std::time::Duration;

pub const MIN_TEMPO: f32 = 60.0;
pub const MAX_TEMPO: f32 = 180.0;
pub const DEFAULT_TEMPO: f32 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockMode {
    /// Free-running timer at the current tempo.
    Internal,
    /// Rising edges on the clock input.
    External,
}

impl ClockMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Internal => "INT",
            Self::External => "EXT",
        }
    }
}

/// Decides once per loop iteration whether a step tick happened.
///
/// Tempo is owned here so a tempo change is seen by the very next `poll`.
pub struct ClockSource {
    mode:       ClockMode,
    tempo:      f32,
    step_len:   Duration,
    last_tick:  Duration,
    last_level: bool,
}

impl ClockSource {
    pub fn new(mode: ClockMode) -> Self {
        let mut clock = Self {
            mode,
            tempo:      DEFAULT_TEMPO,
            step_len:   Duration::ZERO,
            last_tick:  Duration::ZERO,
            last_level: false,
        };
        clock.set_tempo(DEFAULT_TEMPO);
        clock
    }

    pub fn mode(&self) -> ClockMode { self.mode }

    /// Change the tick source. The recorded line level is kept, so a switch
    /// to external on a high line waits for the next rising edge.
    pub fn set_mode(&mut self, mode: ClockMode) {
        self.mode = mode;
    }

    pub fn tempo(&self) -> f32 { self.tempo }

    /// Seconds between internal ticks.
    pub fn step_len(&self) -> Duration { self.step_len }

    pub fn last_tick(&self) -> Duration { self.last_tick }

    /// Clamp to `MIN_TEMPO..=MAX_TEMPO` and recompute the step length.
    pub fn set_tempo(&mut self, bpm: f32) {
        let bpm = if bpm.is_nan() { DEFAULT_TEMPO } else { bpm };
        self.tempo = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
        self.step_len = Duration::from_secs_f32(60.0 / self.tempo);
    }

    /// Returns true if a tick is accepted at `now`. `level` is the external
    /// clock line; it is recorded in every mode so that switching to external
    /// clocking does not fire on a line that was already high.
    pub fn poll(&mut self, now: Duration, level: bool) -> bool {
        let rising = level && !self.last_level;
        self.last_level = level;

        let triggered = match self.mode {
            ClockMode::External => rising,
            ClockMode::Internal => now.saturating_sub(self.last_tick) > self.step_len,
        };
        if triggered { self.last_tick = now; }
        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration { Duration::from_secs_f64(s) }

    #[test]
    fn tempo_is_clamped() {
        let mut c = ClockSource::new(ClockMode::Internal);
        c.set_tempo(20.0);
        assert_eq!(c.tempo(), MIN_TEMPO);
        c.set_tempo(400.0);
        assert_eq!(c.tempo(), MAX_TEMPO);
        c.set_tempo(f32::NAN);
        assert_eq!(c.tempo(), DEFAULT_TEMPO);
    }

    #[test]
    fn internal_ticks_after_step_len() {
        let mut c = ClockSource::new(ClockMode::Internal);
        assert_eq!(c.step_len(), Duration::from_millis(500));
        assert!(!c.poll(secs(0.25), false));
        assert!(!c.poll(secs(0.5), false));
        assert!(c.poll(secs(0.51), false));
        assert_eq!(c.last_tick(), secs(0.51));
        assert!(!c.poll(secs(0.8), false));
        assert!(c.poll(secs(1.02), false));
    }

    #[test]
    fn internal_ignores_clock_line() {
        let mut c = ClockSource::new(ClockMode::Internal);
        assert!(!c.poll(secs(0.1), true));
        assert!(!c.poll(secs(0.2), false));
        assert!(!c.poll(secs(0.3), true));
    }

    #[test]
    fn external_fires_on_rising_edge_only() {
        let mut c = ClockSource::new(ClockMode::External);
        assert!(!c.poll(secs(0.0), false));
        assert!(c.poll(secs(0.001), true));
        assert!(!c.poll(secs(0.002), true));
        assert!(!c.poll(secs(0.003), false));
        assert!(c.poll(secs(0.004), true));
        assert_eq!(c.last_tick(), secs(0.004));
    }

    #[test]
    fn external_ignores_elapsed_time() {
        let mut c = ClockSource::new(ClockMode::External);
        assert!(!c.poll(secs(10.0), false));
    }

    #[test]
    fn switching_to_external_on_high_line_waits_for_next_edge() {
        let mut c = ClockSource::new(ClockMode::Internal);
        c.poll(secs(0.1), true);
        c.set_mode(ClockMode::External);
        assert_eq!(c.mode(), ClockMode::External);
        assert!(!c.poll(secs(0.2), true));
        assert!(!c.poll(secs(0.3), false));
        assert!(c.poll(secs(0.4), true));
    }
}
