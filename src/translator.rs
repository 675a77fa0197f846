//! Event-to-controller translation.
//!
//! Every raw event goes through [`TranslationEngine::translate`], which
//! updates the tracked key and motion state and decides which controller
//! actions the event produces and whether the original event still reaches
//! the OS. Timed follow-ups (recentering the mouse stick, ending a wheel
//! pulse) come out of [`TranslationEngine::tick`].

use crate::config::SharedTuning;
use crate::event::{MouseButton, RawEvent, RawEventKind, ScanCode, Transition, WheelAxis};
use crate::key_state::KeyStateTracker;
use crate::mapping::{AxisKeyMapping, MappingTable, MouseAxis, MouseAxisMapping};
use crate::motion::MotionNormalizer;
use crate::protocol::{AXIS_MAX, Button, ControllerAction, TRIGGER_COUNT, TRIGGER_LEFT, TRIGGER_MAX, TRIGGER_RIGHT};
use std::time::Instant;

/// Outcome of translating one raw event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Ordered; applied together and submitted once. Empty = no action.
    pub actions: Vec<ControllerAction>,
    pub pass_through: bool,
}

impl Translation {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

pub struct TranslationEngine {
    mappings: MappingTable,
    keys: KeyStateTracker,
    motion: MotionNormalizer,
    tuning: SharedTuning,
    hotkey: ScanCode,
    /// A mouse-driven axis was left non-zero by the last motion sample.
    mouse_deflected: bool,
    /// When each trigger's wheel pulse ends.
    pulse_deadlines: [Option<Instant>; TRIGGER_COUNT],
}

impl TranslationEngine {
    pub fn new(mappings: MappingTable, tuning: SharedTuning, hotkey: ScanCode) -> Self {
        Self {
            mappings,
            keys: KeyStateTracker::new(),
            motion: MotionNormalizer::new(Instant::now()),
            tuning,
            hotkey,
            mouse_deflected: false,
            pulse_deadlines: [None; TRIGGER_COUNT],
        }
    }

    pub fn keys(&self) -> &KeyStateTracker {
        &self.keys
    }

    pub fn translate(&mut self, event: &RawEvent) -> Translation {
        self.translate_at(event, Instant::now())
    }

    pub fn translate_at(&mut self, event: &RawEvent, now: Instant) -> Translation {
        let actions = match event.kind {
            RawEventKind::Keyboard { scan_code, transition } => {
                self.map_key(scan_code, transition).into_iter().collect()
            }
            RawEventKind::MouseButton { button, transition } => {
                map_mouse_button(button, transition).into_iter().collect()
            }
            RawEventKind::MouseMove { dx, dy } => self.map_motion(dx, dy, now),
            RawEventKind::MouseWheel { ticks, axis } => {
                self.map_wheel(ticks, axis, now).into_iter().collect()
            }
        };

        let is_hotkey = matches!(
            event.kind,
            RawEventKind::Keyboard { scan_code, .. } if scan_code == self.hotkey
        );
        let pass_through = is_hotkey || actions.is_empty();
        Translation { actions, pass_through }
    }

    /// Actions that are due because time passed rather than because of an event.
    pub fn tick(&mut self, now: Instant) -> Vec<ControllerAction> {
        let mut actions = Vec::new();

        let idle_reset = self.tuning.mouse_idle_reset();
        if self.mouse_deflected && !idle_reset.is_zero() && self.motion.idle_for(now) >= idle_reset {
            actions.extend(self.mappings.mouse_axes().map(|index| ControllerAction::Axis { index, value: 0 }));
            self.mouse_deflected = false;
        }

        for index in [TRIGGER_LEFT, TRIGGER_RIGHT] {
            let slot = &mut self.pulse_deadlines[usize::from(index)];
            if slot.is_some_and(|deadline| now >= deadline) {
                *slot = None;
                let value = self.held_trigger_value(index);
                actions.push(ControllerAction::Trigger { index, value });
            }
        }

        actions
    }

    /// Earliest instant at which [`tick`](Self::tick) has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let idle_reset = self.tuning.mouse_idle_reset();
        let recenter = (self.mouse_deflected && !idle_reset.is_zero())
            .then(|| self.motion.last_sample() + idle_reset);
        self.pulse_deadlines.iter().flatten().copied().chain(recenter).min()
    }

    /// Forgets held keys, pending pulses and mouse deflection.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.motion.reset(Instant::now());
        self.mouse_deflected = false;
        self.pulse_deadlines = [None; TRIGGER_COUNT];
    }

    fn map_key(&mut self, scan_code: ScanCode, transition: Transition) -> Option<ControllerAction> {
        let pressed = transition.is_down();
        self.keys.set(scan_code, pressed);

        if let Some(m) = self.mappings.find_button(scan_code) {
            return Some(ControllerAction::Button { button: m.button, pressed });
        }

        if let Some(m) = self.mappings.find_trigger(scan_code) {
            let index = m.trigger;
            let value = if pressed { i32::from(m.max) } else { 0 };
            // A key takes over from a running wheel pulse
            if let Some(slot) = self.pulse_deadlines.get_mut(usize::from(index)) {
                *slot = None;
            }
            return Some(ControllerAction::Trigger { index, value });
        }

        let pair = self.mappings.find_axis_pair(scan_code).copied();
        pair.map(|m| self.axis_from_keys(&m))
    }

    /// Axis value from the current state of both keys of the pair.
    fn axis_from_keys(&self, m: &AxisKeyMapping) -> ControllerAction {
        let negative = self.keys.is_pressed(m.negative);
        let positive = self.keys.is_pressed(m.positive);
        let value = match (negative, positive) {
            (true, false) => -m.max,
            (false, true) => m.max,
            _ => 0,
        };
        ControllerAction::Axis { index: m.axis, value }
    }

    fn map_motion(&mut self, dx: i32, dy: i32, now: Instant) -> Vec<ControllerAction> {
        let (vx, vy) = self.motion.velocity(dx, dy, now);
        let sensitivity = self.tuning.mouse_sensitivity();
        let deadzone = self.tuning.analog_deadzone();

        let mut actions = Vec::with_capacity(2);
        for (axis, velocity) in [(MouseAxis::X, vx), (MouseAxis::Y, vy)] {
            if let Some(m) = self.mappings.find_mouse_axis(axis) {
                let value = stick_value(velocity, m, sensitivity, deadzone);
                if value != 0 {
                    self.mouse_deflected = true;
                }
                actions.push(ControllerAction::Axis { index: m.axis, value });
            }
        }
        actions
    }

    fn map_wheel(&mut self, ticks: i32, axis: WheelAxis, now: Instant) -> Option<ControllerAction> {
        if axis != WheelAxis::Vertical || ticks == 0 {
            return None;
        }
        let index = if ticks > 0 { TRIGGER_RIGHT } else { TRIGGER_LEFT };
        let pulse = self.tuning.wheel_pulse();
        self.pulse_deadlines[usize::from(index)] = if pulse.is_zero() { None } else { Some(now + pulse) };
        Some(ControllerAction::Trigger { index, value: i32::from(TRIGGER_MAX) })
    }

    /// Largest magnitude among held keys mapped to trigger `index`, else 0.
    fn held_trigger_value(&self, index: u8) -> i32 {
        self.mappings
            .triggers_for(index)
            .filter(|m| self.keys.is_pressed(m.key))
            .map(|m| i32::from(m.max))
            .max()
            .unwrap_or(0)
    }
}

/// Left click presses the right stick, right click the left stick.
fn map_mouse_button(button: MouseButton, transition: Transition) -> Option<ControllerAction> {
    let button = match button {
        MouseButton::Left => Button::RightThumb,
        MouseButton::Right => Button::LeftThumb,
        _ => return None,
    };
    Some(ControllerAction::Button { button, pressed: transition.is_down() })
}

/// Velocity → stick value: scale, clamp to ±32767, truncate, invert, then
/// zero anything strictly inside the dead zone.
pub fn stick_value(velocity: f32, m: &MouseAxisMapping, sensitivity: f32, deadzone: i32) -> i32 {
    let limit = AXIS_MAX as f32;
    let scaled = (velocity * m.sensitivity * sensitivity).clamp(-limit, limit);
    // NaN only if the inputs were; treat as no motion
    let mut value = if scaled.is_nan() { 0 } else { scaled as i32 };
    if m.invert {
        value = -value;
    }
    if value.abs() < deadzone { 0 } else { value }
}
