pub mod gamepad;
pub mod xbox360_layout;

use evdev::{
    AttributeSet, Key, RelativeAxisType,
    uinput::{VirtualDevice, VirtualDeviceBuilder},
};
use std::io;

/// Every uinput device this program creates is named with this prefix, so
/// discovery never captures its own output.
pub const NAME_PREFIX: &str = "Retro Pad Emulator";

/// Full uinput name for one of this program's devices.
pub fn device_name(kind: &str) -> String {
    format!("{} {}", NAME_PREFIX, kind)
}

/// Mouse buttons forwarded by the pass-through mouse, in `MouseButton` order.
pub const MOUSE_BUTTONS: [Key; 5] = [
    Key::BTN_LEFT,
    Key::BTN_RIGHT,
    Key::BTN_MIDDLE,
    Key::BTN_SIDE,
    Key::BTN_EXTRA,
];

/// Virtual mouse that re-emits the grabbed mouse's events the OS should see.
pub fn create_passthrough_mouse() -> io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<Key>::new();
    for key in MOUSE_BUTTONS {
        keys.insert(key);
    }

    let mut rel_axes = AttributeSet::<RelativeAxisType>::new();
    rel_axes.insert(RelativeAxisType::REL_X);
    rel_axes.insert(RelativeAxisType::REL_Y);
    rel_axes.insert(RelativeAxisType::REL_WHEEL);
    rel_axes.insert(RelativeAxisType::REL_HWHEEL);

    let name = device_name("Mouse");
    VirtualDeviceBuilder::new()?
        .name(&name)
        .with_keys(&keys)?
        .with_relative_axes(&rel_axes)?
        .build()
}

/// Virtual keyboard for unmapped keys and the toggle hotkey.
pub fn create_passthrough_keyboard() -> io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<Key>::new();

    // Regular and media keys only. Mouse/joystick buttons (0x100..0x160) and
    // BTN_TRIGGER_HAPPY stay out so udev does not tag it as a joystick
    for code in (1..0x100).chain(0x160..0x2c0) {
        keys.insert(Key::new(code));
    }

    let name = device_name("Keyboard");
    VirtualDeviceBuilder::new()?
        .name(&name)
        .with_keys(&keys)?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_devices_carry_the_prefix() {
        for kind in ["Mouse", "Keyboard", "Xbox 360"] {
            let name = device_name(kind);
            assert!(name.starts_with(NAME_PREFIX));
            assert!(name.ends_with(kind));
        }
    }
}
