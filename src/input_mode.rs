use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Keyboard and mouse reach the OS untouched.
    MouseKeyboard,
    /// Keyboard and mouse drive the virtual gamepad.
    Gamepad,
}

impl InputMode {
    pub fn from_active(active: bool) -> Self {
        if active { InputMode::Gamepad } else { InputMode::MouseKeyboard }
    }

    pub fn is_gamepad(self) -> bool {
        self == InputMode::Gamepad
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::MouseKeyboard => write!(f, "mouse+keyboard"),
            InputMode::Gamepad => write!(f, "gamepad"),
        }
    }
}

/// "Emulation active" flag shared by the hotkey watcher (writer) and the
/// pipeline (reader). Cloning gives another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct InputModeSwitch {
    active: Arc<AtomicBool>,
}

impl InputModeSwitch {
    pub fn new(mode: InputMode) -> Self {
        Self { active: Arc::new(AtomicBool::new(mode.is_gamepad())) }
    }

    pub fn mode(&self) -> InputMode {
        InputMode::from_active(self.active.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set(&self, mode: InputMode) {
        self.active.store(mode.is_gamepad(), Ordering::Release);
    }

    /// Flips the mode and returns the new one.
    pub fn toggle(&self) -> InputMode {
        let was_active = self.active.fetch_xor(true, Ordering::AcqRel);
        InputMode::from_active(!was_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_mouse_keyboard() {
        let switch = InputModeSwitch::default();
        assert_eq!(switch.mode(), InputMode::MouseKeyboard);
        assert!(!switch.is_active());
    }

    #[test]
    fn toggle_is_seen_by_every_handle() {
        let switch = InputModeSwitch::new(InputMode::MouseKeyboard);
        let reader = switch.clone();

        assert_eq!(switch.toggle(), InputMode::Gamepad);
        assert!(reader.is_active());
        assert_eq!(switch.toggle(), InputMode::MouseKeyboard);
        assert!(!reader.is_active());

        reader.set(InputMode::Gamepad);
        assert_eq!(switch.mode(), InputMode::Gamepad);
    }

    #[test]
    fn toggles_from_another_thread() {
        let switch = InputModeSwitch::new(InputMode::Gamepad);
        let writer = switch.clone();
        std::thread::spawn(move || {
            writer.toggle();
        })
        .join()
        .unwrap();
        assert_eq!(switch.mode(), InputMode::MouseKeyboard);
    }
}
