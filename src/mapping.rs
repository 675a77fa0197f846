//! Static associations between physical inputs and controller outputs.
//!
//! The table is loaded once at startup (compile-time defaults, optionally
//! replaced by a `[mappings]` profile from the config file) and only changes
//! through [`MappingTable::reconfigure`].

use crate::error::MappingError;
use crate::event::ScanCode;
use crate::protocol::{
    AXIS_COUNT, AXIS_LEFT_X, AXIS_LEFT_Y, AXIS_MAX, AXIS_RIGHT_X, AXIS_RIGHT_Y, Button,
    TRIGGER_COUNT, TRIGGER_LEFT, TRIGGER_MAX, TRIGGER_RIGHT,
};
use evdev::Key;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMapping {
    pub key: ScanCode,
    pub button: Button,
}

/// Two keys driving one analog axis in opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisKeyMapping {
    pub negative: ScanCode,
    pub positive: ScanCode,
    pub axis: u8,
    #[serde(default = "default_axis_magnitude")]
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerKeyMapping {
    pub key: ScanCode,
    pub trigger: u8,
    #[serde(default = "default_trigger_magnitude")]
    pub max: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseAxisMapping {
    pub mouse_axis: MouseAxis,
    pub axis: u8,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default)]
    pub invert: bool,
}

fn default_axis_magnitude() -> i32 {
    AXIS_MAX
}

fn default_trigger_magnitude() -> u8 {
    TRIGGER_MAX
}

fn default_sensitivity() -> f32 {
    1.0
}

/// Deserialized as a complete replacement: categories a profile leaves out
/// stay empty rather than picking up the built-in layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default = "MappingTable::empty")]
pub struct MappingTable {
    pub buttons: Vec<ButtonMapping>,
    pub axes: Vec<AxisKeyMapping>,
    pub triggers: Vec<TriggerKeyMapping>,
    pub mouse: Vec<MouseAxisMapping>,
}

impl Default for MappingTable {
    fn default() -> Self {
        let button = |key: Key, button| ButtonMapping { key: key.code(), button };
        let axis = |negative: Key, positive: Key, axis| AxisKeyMapping {
            negative: negative.code(),
            positive: positive.code(),
            axis,
            max: AXIS_MAX,
        };
        let trigger = |key: Key, trigger| TriggerKeyMapping {
            key: key.code(),
            trigger,
            max: TRIGGER_MAX,
        };

        Self {
            buttons: vec![
                button(Key::KEY_SPACE, Button::A),
                button(Key::KEY_LEFTCTRL, Button::B),
                button(Key::KEY_E, Button::X),
                button(Key::KEY_R, Button::Y),
                button(Key::KEY_Q, Button::LeftShoulder),
                button(Key::KEY_F, Button::RightShoulder),
                button(Key::KEY_TAB, Button::Back),
                button(Key::KEY_ESC, Button::Start),
                button(Key::KEY_UP, Button::DpadUp),
                button(Key::KEY_DOWN, Button::DpadDown),
                button(Key::KEY_LEFT, Button::DpadLeft),
                button(Key::KEY_RIGHT, Button::DpadRight),
            ],
            // Y follows XInput: up is positive
            axes: vec![
                axis(Key::KEY_A, Key::KEY_D, AXIS_LEFT_X),
                axis(Key::KEY_S, Key::KEY_W, AXIS_LEFT_Y),
            ],
            triggers: vec![
                trigger(Key::KEY_Z, TRIGGER_LEFT),
                trigger(Key::KEY_C, TRIGGER_RIGHT),
            ],
            mouse: vec![
                MouseAxisMapping {
                    mouse_axis: MouseAxis::X,
                    axis: AXIS_RIGHT_X,
                    sensitivity: 1.0,
                    invert: false,
                },
                MouseAxisMapping {
                    mouse_axis: MouseAxis::Y,
                    axis: AXIS_RIGHT_Y,
                    sensitivity: 1.0,
                    invert: true,
                },
            ],
        }
    }
}

impl MappingTable {
    pub fn empty() -> Self {
        Self { buttons: Vec::new(), axes: Vec::new(), triggers: Vec::new(), mouse: Vec::new() }
    }

    pub fn find_button(&self, key: ScanCode) -> Option<&ButtonMapping> {
        self.buttons.iter().find(|m| m.key == key)
    }

    pub fn find_trigger(&self, key: ScanCode) -> Option<&TriggerKeyMapping> {
        self.triggers.iter().find(|m| m.key == key)
    }

    pub fn find_axis_pair(&self, key: ScanCode) -> Option<&AxisKeyMapping> {
        self.axes.iter().find(|m| m.negative == key || m.positive == key)
    }

    /// First mapping for `axis`; later duplicates are never used.
    pub fn find_mouse_axis(&self, axis: MouseAxis) -> Option<&MouseAxisMapping> {
        self.mouse.iter().find(|m| m.mouse_axis == axis)
    }

    /// Trigger key mappings that drive trigger `index`.
    pub fn triggers_for(&self, index: u8) -> impl Iterator<Item = &TriggerKeyMapping> {
        self.triggers.iter().filter(move |m| m.trigger == index)
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        let mut seen: HashSet<ScanCode> = HashSet::new();
        let mut claim = |key: ScanCode| {
            if seen.insert(key) { Ok(()) } else { Err(MappingError::DuplicateKey(key)) }
        };

        for m in &self.buttons {
            claim(m.key)?;
        }

        for m in &self.triggers {
            if usize::from(m.trigger) >= TRIGGER_COUNT {
                return Err(MappingError::InvalidTrigger(m.trigger));
            }
            claim(m.key)?;
        }

        for m in &self.axes {
            if usize::from(m.axis) >= AXIS_COUNT {
                return Err(MappingError::InvalidAxis(m.axis));
            }
            if m.max <= 0 || m.max > AXIS_MAX {
                return Err(MappingError::InvalidMagnitude(m.max));
            }
            if m.negative == m.positive {
                return Err(MappingError::SameKeyPair(m.negative));
            }
            claim(m.negative)?;
            claim(m.positive)?;
        }

        for m in &self.mouse {
            if usize::from(m.axis) >= AXIS_COUNT {
                return Err(MappingError::InvalidAxis(m.axis));
            }
            if !m.sensitivity.is_finite() || m.sensitivity <= 0.0 {
                return Err(MappingError::InvalidSensitivity(m.sensitivity));
            }
        }

        Ok(())
    }

    /// Replaces the whole table with `table` if it is valid; otherwise the
    /// current table is left untouched.
    pub fn reconfigure(&mut self, table: MappingTable) -> Result<(), MappingError> {
        table.validate()?;
        *self = table;
        Ok(())
    }

    /// Analog axes driven by the mouse.
    pub fn mouse_axes(&self) -> impl Iterator<Item = u8> + '_ {
        [MouseAxis::X, MouseAxis::Y]
            .into_iter()
            .filter_map(|axis| self.find_mouse_axis(axis).map(|m| m.axis))
    }
}
