use serde::{Deserialize, Serialize};

// Controller axis and trigger indices
pub const AXIS_LEFT_X: u8 = 0;
pub const AXIS_LEFT_Y: u8 = 1;
pub const AXIS_RIGHT_X: u8 = 2;
pub const AXIS_RIGHT_Y: u8 = 3;
pub const AXIS_COUNT: usize = 4;

pub const TRIGGER_LEFT: u8 = 0;
pub const TRIGGER_RIGHT: u8 = 1;
pub const TRIGGER_COUNT: usize = 2;

pub const AXIS_MAX: i32 = 32767;
pub const AXIS_MIN: i32 = -32768;
pub const TRIGGER_MAX: u8 = 255;

/// Logical controller buttons, valued by their XUSB report bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Start,
    Back,
    LeftThumb,
    RightThumb,
    LeftShoulder,
    RightShoulder,
    Guide,
    A,
    B,
    X,
    Y,
}

impl Button {
    pub const ALL: [Button; 15] = [
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::Start,
        Button::Back,
        Button::LeftThumb,
        Button::RightThumb,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::Guide,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
    ];

    pub fn mask(self) -> u16 {
        match self {
            Button::DpadUp => 0x0001,
            Button::DpadDown => 0x0002,
            Button::DpadLeft => 0x0004,
            Button::DpadRight => 0x0008,
            Button::Start => 0x0010,
            Button::Back => 0x0020,
            Button::LeftThumb => 0x0040,
            Button::RightThumb => 0x0080,
            Button::LeftShoulder => 0x0100,
            Button::RightShoulder => 0x0200,
            Button::Guide => 0x0400,
            Button::A => 0x1000,
            Button::B => 0x2000,
            Button::X => 0x4000,
            Button::Y => 0x8000,
        }
    }
}

/// A single change to the controller state, produced by the translation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAction {
    Button { button: Button, pressed: bool },
    Axis { index: u8, value: i32 },
    Trigger { index: u8, value: i32 },
}

pub fn axis_name(index: u8) -> &'static str {
    match index {
        AXIS_LEFT_X => "Left X",
        AXIS_LEFT_Y => "Left Y",
        AXIS_RIGHT_X => "Right X",
        AXIS_RIGHT_Y => "Right Y",
        _ => "Unknown",
    }
}

pub fn trigger_name(index: u8) -> &'static str {
    match index {
        TRIGGER_LEFT => "Trigger L",
        TRIGGER_RIGHT => "Trigger R",
        _ => "Unknown",
    }
}

impl std::fmt::Display for ControllerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            ControllerAction::Button { button, pressed } => write!(
                f,
                "button {:?} {}",
                button,
                if pressed { "pressed" } else { "released" }
            ),
            ControllerAction::Axis { index, value } => {
                write!(f, "axis {} ({}) = {}", index, axis_name(index), value)
            }
            ControllerAction::Trigger { index, value } => {
                write!(f, "trigger {} ({}) = {}", index, trigger_name(index), value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_masks_are_distinct_bits() {
        let mut seen = 0u16;
        for button in Button::ALL {
            let mask = button.mask();
            assert_eq!(mask.count_ones(), 1, "{:?}", button);
            assert_eq!(seen & mask, 0, "{:?} overlaps", button);
            seen |= mask;
        }
        // 0x0800 is unused in the XUSB report
        assert_eq!(seen, 0xF7FF);
    }
}
