//! The authoritative controller snapshot and the reducer that merges actions
//! into it before handing it to the virtual controller.

use crate::error::{StateError, SubmitError};
use crate::protocol::{AXIS_COUNT, AXIS_MAX, AXIS_MIN, Button, ControllerAction, TRIGGER_COUNT};
use bytemuck::{Pod, Zeroable};

/// Same layout as an XUSB report: buttons, triggers, then the four stick axes.
/// Axis order is LX, LY, RX, RY; positive Y is up.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ControllerState {
    pub buttons: u16,
    pub triggers: [u8; TRIGGER_COUNT],
    pub axes: [i16; AXIS_COUNT],
}

impl ControllerState {
    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Anything that can take a full controller report, e.g. the uinput gamepad.
pub trait ControllerSink {
    fn submit(&mut self, state: &ControllerState) -> Result<(), SubmitError>;
}

/// Owns the controller state; the only place it is mutated.
pub struct ControllerStateReducer<S> {
    state: ControllerState,
    sink: S,
}

impl<S: ControllerSink> ControllerStateReducer<S> {
    pub fn new(sink: S) -> Self {
        Self { state: ControllerState::default(), sink }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Merges one action into the state. Nothing is changed on error.
    pub fn apply_action(&mut self, action: &ControllerAction) -> Result<(), StateError> {
        match *action {
            ControllerAction::Button { button, pressed } => {
                if pressed {
                    self.state.buttons |= button.mask();
                } else {
                    self.state.buttons &= !button.mask();
                }
            }
            ControllerAction::Axis { index, value } => {
                let slot = self
                    .state
                    .axes
                    .get_mut(usize::from(index))
                    .ok_or(StateError::InvalidAxis(index))?;
                *slot = value.clamp(AXIS_MIN, AXIS_MAX) as i16;
            }
            ControllerAction::Trigger { index, value } => {
                let value = u8::try_from(value).map_err(|_| StateError::TriggerOutOfRange(value))?;
                let slot = self
                    .state
                    .triggers
                    .get_mut(usize::from(index))
                    .ok_or(StateError::InvalidTrigger(index))?;
                *slot = value;
            }
        }
        Ok(())
    }

    /// Pushes the whole snapshot. On failure the state stays as computed; the
    /// next successful submit brings the device back in sync.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        self.sink.submit(&self.state)
    }

    /// Neutral state: no buttons, centered sticks, released triggers.
    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocol::{AXIS_LEFT_Y, AXIS_RIGHT_X, TRIGGER_LEFT, TRIGGER_RIGHT};
    use std::io;

    /// Records every submitted report; optionally fails every submit.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub reports: Vec<ControllerState>,
        pub fail: bool,
    }

    impl ControllerSink for RecordingSink {
        fn submit(&mut self, state: &ControllerState) -> Result<(), SubmitError> {
            if self.fail {
                return Err(SubmitError(io::Error::other("device gone")));
            }
            self.reports.push(*state);
            Ok(())
        }
    }

    fn reducer() -> ControllerStateReducer<RecordingSink> {
        ControllerStateReducer::new(RecordingSink::default())
    }

    #[test]
    fn state_matches_xusb_report_size() {
        assert_eq!(std::mem::size_of::<ControllerState>(), 12);
        let mut state = ControllerState::default();
        state.buttons = 0x1001;
        state.triggers[TRIGGER_RIGHT as usize] = 0xFF;
        assert_eq!(&state.as_bytes()[..4], &[0x01, 0x10, 0x00, 0xFF]);
    }

    #[test]
    fn pressing_twice_is_idempotent() {
        let mut r = reducer();
        let press = ControllerAction::Button { button: Button::A, pressed: true };
        r.apply_action(&press).unwrap();
        let once = *r.state();
        r.apply_action(&press).unwrap();
        assert_eq!(*r.state(), once);
        assert!(r.state().is_pressed(Button::A));
    }

    #[test]
    fn press_then_release_restores_bitmask() {
        let mut r = reducer();
        r.apply_action(&ControllerAction::Button { button: Button::X, pressed: true }).unwrap();
        let before = r.state().buttons;

        r.apply_action(&ControllerAction::Button { button: Button::B, pressed: true }).unwrap();
        r.submit().unwrap();
        r.apply_action(&ControllerAction::Button { button: Button::B, pressed: false }).unwrap();
        r.submit().unwrap();

        assert_eq!(r.state().buttons, before);
        assert_eq!(r.sink().reports.last().map(|s| s.buttons), Some(before));
        assert!(r.sink().reports[0].is_pressed(Button::B));
    }

    #[test]
    fn axis_values_are_clamped() {
        let mut r = reducer();
        r.apply_action(&ControllerAction::Axis { index: AXIS_RIGHT_X, value: 100_000 }).unwrap();
        r.apply_action(&ControllerAction::Axis { index: AXIS_LEFT_Y, value: -100_000 }).unwrap();
        assert_eq!(r.state().axes[AXIS_RIGHT_X as usize], 32767);
        assert_eq!(r.state().axes[AXIS_LEFT_Y as usize], -32768);
    }

    #[test]
    fn invalid_actions_are_rejected_without_change() {
        let mut r = reducer();
        assert_eq!(
            r.apply_action(&ControllerAction::Axis { index: 4, value: 1 }),
            Err(StateError::InvalidAxis(4))
        );
        assert_eq!(
            r.apply_action(&ControllerAction::Trigger { index: 2, value: 10 }),
            Err(StateError::InvalidTrigger(2))
        );
        assert_eq!(
            r.apply_action(&ControllerAction::Trigger { index: TRIGGER_LEFT, value: 256 }),
            Err(StateError::TriggerOutOfRange(256))
        );
        assert_eq!(
            r.apply_action(&ControllerAction::Trigger { index: TRIGGER_LEFT, value: -1 }),
            Err(StateError::TriggerOutOfRange(-1))
        );
        assert_eq!(*r.state(), ControllerState::default());
    }

    #[test]
    fn trigger_accepts_full_range() {
        let mut r = reducer();
        r.apply_action(&ControllerAction::Trigger { index: TRIGGER_LEFT, value: 255 }).unwrap();
        r.apply_action(&ControllerAction::Trigger { index: TRIGGER_RIGHT, value: 0 }).unwrap();
        assert_eq!(r.state().triggers, [255, 0]);
    }

    #[test]
    fn failed_submit_keeps_state() {
        let mut r = ControllerStateReducer::new(RecordingSink { fail: true, ..Default::default() });
        r.apply_action(&ControllerAction::Button { button: Button::Start, pressed: true }).unwrap();
        assert!(r.submit().is_err());
        assert!(r.state().is_pressed(Button::Start));
    }

    #[test]
    fn reset_returns_to_neutral() {
        let mut r = reducer();
        r.apply_action(&ControllerAction::Axis { index: AXIS_RIGHT_X, value: 1234 }).unwrap();
        r.reset();
        assert_eq!(*r.state(), ControllerState::default());
    }
}
