use crate::protocol::{
    AXIS_LEFT_X, AXIS_LEFT_Y, AXIS_RIGHT_X, AXIS_RIGHT_Y, Button, TRIGGER_LEFT, TRIGGER_RIGHT,
};
use evdev::{AbsoluteAxisType, Key};

/// EXACT layout of a real Xbox 360 pad as evtest and xpad report it.
/// Use it to build an identical virtual device.
pub struct Xbox360Layout;

/// Real Xbox 360 pad buttons through evdev (xpad driver).
///
/// NOTE: the pad has **11 real buttons**:
/// A, B, X, Y,
/// LB, RB,
/// Back, Start,
/// Guide,
/// Stick Left Press, Stick Right Press
///
/// The D-pad is not buttons: xpad reports it on ABS_HAT0X/ABS_HAT0Y.
impl Xbox360Layout {
    pub const BUTTON_COUNT: usize = 11;

    /// Real buttons in standard order (A,B,X,Y,LB,RB,Back,Start,Guide,L3,R3)
    pub const BUTTONS: [(Button, Key); Self::BUTTON_COUNT] = [
        (Button::A, Key::BTN_SOUTH),
        (Button::B, Key::BTN_EAST),
        (Button::X, Key::BTN_NORTH),
        (Button::Y, Key::BTN_WEST),
        (Button::LeftShoulder, Key::BTN_TL),
        (Button::RightShoulder, Key::BTN_TR),
        (Button::Back, Key::BTN_SELECT),
        (Button::Start, Key::BTN_START),
        (Button::Guide, Key::BTN_MODE),
        (Button::LeftThumb, Key::BTN_THUMBL),
        (Button::RightThumb, Key::BTN_THUMBR),
    ];

    // ----- AXES -----
    //   ABS_X      left stick X      (-32768..32767)
    //   ABS_Y      left stick Y      (-32768..32767, down positive)
    //   ABS_RX     right stick X     (-32768..32767)
    //   ABS_RY     right stick Y     (-32768..32767, down positive)
    //   ABS_Z      left trigger      (0..255)
    //   ABS_RZ     right trigger     (0..255)
    //   ABS_HAT0X  dpad horizontal   [-1, 0, +1]
    //   ABS_HAT0Y  dpad vertical     [-1, 0, +1]
    pub const STICK_AXES: [(u8, AbsoluteAxisType); 4] = [
        (AXIS_LEFT_X, AbsoluteAxisType::ABS_X),
        (AXIS_LEFT_Y, AbsoluteAxisType::ABS_Y),
        (AXIS_RIGHT_X, AbsoluteAxisType::ABS_RX),
        (AXIS_RIGHT_Y, AbsoluteAxisType::ABS_RY),
    ];

    pub const TRIGGER_AXES: [(u8, AbsoluteAxisType); 2] = [
        (TRIGGER_LEFT, AbsoluteAxisType::ABS_Z),
        (TRIGGER_RIGHT, AbsoluteAxisType::ABS_RZ),
    ];

    pub const HAT_AXES: [AbsoluteAxisType; 2] =
        [AbsoluteAxisType::ABS_HAT0X, AbsoluteAxisType::ABS_HAT0Y];

    // Standard ranges xpad uses on Linux (evdev)
    pub const STICK_MIN: i32 = -32768;
    pub const STICK_MAX: i32 = 32767;
    pub const STICK_FUZZ: i32 = 16;
    pub const STICK_FLAT: i32 = 128;

    pub const TRIGGER_MIN: i32 = 0;
    pub const TRIGGER_MAX: i32 = 255;

    pub const HAT_MIN: i32 = -1;
    pub const HAT_MAX: i32 = 1;

    pub fn button_code(button: Button) -> Option<Key> {
        Self::BUTTONS
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, key)| *key)
    }

    pub fn stick_axis(index: u8) -> Option<AbsoluteAxisType> {
        Self::STICK_AXES
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, axis)| *axis)
    }

    /// Y sticks report "up" as negative.
    pub fn is_inverted(index: u8) -> bool {
        index == AXIS_LEFT_Y || index == AXIS_RIGHT_Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpad_has_no_button_code() {
        for button in [Button::DpadUp, Button::DpadDown, Button::DpadLeft, Button::DpadRight] {
            assert_eq!(Xbox360Layout::button_code(button), None);
        }
        assert_eq!(Xbox360Layout::button_code(Button::A), Some(Key::BTN_SOUTH));
        assert_eq!(Xbox360Layout::button_code(Button::RightThumb), Some(Key::BTN_THUMBR));
    }

    #[test]
    fn every_other_button_is_exposed() {
        let exposed = Button::ALL
            .iter()
            .filter(|b| Xbox360Layout::button_code(**b).is_some())
            .count();
        assert_eq!(exposed, Xbox360Layout::BUTTON_COUNT);
    }

    #[test]
    fn stick_axes_follow_xpad_codes() {
        assert_eq!(Xbox360Layout::stick_axis(AXIS_RIGHT_X), Some(AbsoluteAxisType::ABS_RX));
        assert_eq!(Xbox360Layout::stick_axis(4), None);
        assert!(Xbox360Layout::is_inverted(AXIS_LEFT_Y));
        assert!(!Xbox360Layout::is_inverted(AXIS_RIGHT_X));
    }
}
