use super::xbox360_layout::Xbox360Layout;
use crate::controller_state::{ControllerSink, ControllerState};
use crate::error::SubmitError;
use crate::protocol::Button;
use evdev::{
    AbsInfo, AttributeSet, EventType, InputEvent, Key, UinputAbsSetup,
    uinput::{VirtualDevice, VirtualDeviceBuilder},
};
use std::io;
use tracing::info;

/// uinput gamepad that looks like a wired Xbox 360 pad to games.
pub struct VirtualGamepad {
    device: VirtualDevice,
}

impl VirtualGamepad {
    pub fn create() -> io::Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for (_, key) in Xbox360Layout::BUTTONS {
            keys.insert(key);
        }

        let name = super::device_name("Xbox 360");
        let mut builder = VirtualDeviceBuilder::new()?.name(&name).with_keys(&keys)?;

        let stick = AbsInfo::new(
            0,
            Xbox360Layout::STICK_MIN,
            Xbox360Layout::STICK_MAX,
            Xbox360Layout::STICK_FUZZ,
            Xbox360Layout::STICK_FLAT,
            0,
        );
        let trigger = AbsInfo::new(0, Xbox360Layout::TRIGGER_MIN, Xbox360Layout::TRIGGER_MAX, 0, 0, 0);
        let hat = AbsInfo::new(0, Xbox360Layout::HAT_MIN, Xbox360Layout::HAT_MAX, 0, 0, 0);

        let axes = Xbox360Layout::STICK_AXES
            .iter()
            .map(|(_, axis)| (*axis, stick))
            .chain(Xbox360Layout::TRIGGER_AXES.iter().map(|(_, axis)| (*axis, trigger)))
            .chain(Xbox360Layout::HAT_AXES.iter().map(|axis| (*axis, hat)));

        for (axis, info) in axes {
            builder = builder.with_absolute_axis(&UinputAbsSetup::new(axis, info))?;
        }

        let device = builder.build()?;
        info!("Virtual Xbox 360 gamepad created");
        Ok(Self { device })
    }
}

impl ControllerSink for VirtualGamepad {
    fn submit(&mut self, state: &ControllerState) -> Result<(), SubmitError> {
        // emit() closes the batch with SYN_REPORT, so readers see one frame
        self.device.emit(&report_events(state))?;
        Ok(())
    }
}

impl Drop for VirtualGamepad {
    fn drop(&mut self) {
        info!("Virtual Xbox 360 gamepad released");
    }
}

/// Every key and axis of the pad for one full report, without the SYN_REPORT.
pub fn report_events(state: &ControllerState) -> Vec<InputEvent> {
    let mut events = Vec::with_capacity(Xbox360Layout::BUTTON_COUNT + 8);

    for (button, key) in Xbox360Layout::BUTTONS {
        let value = i32::from(state.is_pressed(button));
        events.push(InputEvent::new(EventType::KEY, key.code(), value));
    }

    for (index, axis) in Xbox360Layout::STICK_AXES {
        let raw = state.axes[usize::from(index)];
        // Same as xpad: ~y flips -32768..32767 without overflow
        let value = if Xbox360Layout::is_inverted(index) { !raw } else { raw };
        events.push(InputEvent::new(EventType::ABSOLUTE, axis.0, i32::from(value)));
    }

    for (index, axis) in Xbox360Layout::TRIGGER_AXES {
        let value = i32::from(state.triggers[usize::from(index)]);
        events.push(InputEvent::new(EventType::ABSOLUTE, axis.0, value));
    }

    let pressed = |button| i32::from(state.is_pressed(button));
    let hat_x = pressed(Button::DpadRight) - pressed(Button::DpadLeft);
    let hat_y = pressed(Button::DpadDown) - pressed(Button::DpadUp);
    let [hat_x_axis, hat_y_axis] = Xbox360Layout::HAT_AXES;
    events.push(InputEvent::new(EventType::ABSOLUTE, hat_x_axis.0, hat_x));
    events.push(InputEvent::new(EventType::ABSOLUTE, hat_y_axis.0, hat_y));

    events
}
