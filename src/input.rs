use std::time::Duration;

/// Minimum spacing between two accepted button transitions.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// How long the button must stay down before it counts as held.
pub const HOLD_TIME: Duration = Duration::from_secs(1);

/// knob1 readings below this mean the button is pulling the line low.
/// 16 suits a 10k pot, 4 a 50k pot.
pub const DEFAULT_BUTTON_THRESHOLD: u8 = 4;

/// Scale a 16-bit analog reading down to a 0–255 knob value.
pub fn normalize(raw: u16) -> u8 {
    (raw >> 8) as u8
}

// ── Button state ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ButtonState {
    /// Debounced level.
    pub pressed: bool,
    /// Pressed continuously for at least `HOLD_TIME`.
    pub held:    bool,
    /// An accepted transition happened during this sample.
    pub changed: bool,
    /// When the last accepted transition happened, if any.
    pub last_transition: Option<Duration>,
}

/// One sample's worth of normalized control readings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub knob0:  u8,
    pub knob1:  u8,
    pub button: ButtonState,
}

// ── Sampler ───────────────────────────────────────────────────────────────────

/// Turns raw knob readings into stable controls. The button shares the knob1
/// line, so a press shows up as knob1 dropping below the threshold.
pub struct InputSampler {
    threshold: u8,
    button:    ButtonState,
}

impl InputSampler {
    pub fn new(threshold: u8) -> Self {
        Self { threshold, button: ButtonState::default() }
    }

    pub fn button(&self) -> ButtonState { self.button }

    pub fn sample(&mut self, knob0_raw: u16, knob1_raw: u16, now: Duration) -> Controls {
        let knob0 = normalize(knob0_raw);
        let knob1 = normalize(knob1_raw);

        let b = &mut self.button;
        b.changed = false;
        let new_pressed = knob1 < self.threshold;

        if new_pressed != b.pressed {
            let settled = match b.last_transition {
                None    => true,
                Some(t) => now.saturating_sub(t) >= DEBOUNCE,
            };
            if settled {
                b.pressed = new_pressed;
                b.changed = true;
                b.last_transition = Some(now);
            }
            // `held` keeps its old value on a flip, so releasing a hold does
            // not read as a tap.
        } else {
            b.held = b.pressed
                && b.last_transition.is_some_and(|t| now.saturating_sub(t) >= HOLD_TIME);
        }

        Controls { knob0, knob1, button: self.button }
    }
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new(DEFAULT_BUTTON_THRESHOLD)
    }
}
