use crate::event::ScanCode;
use std::collections::HashMap;

/// Pressed/released state of every physical key seen so far.
///
/// Unknown keys read as released.
#[derive(Debug, Default, Clone)]
pub struct KeyStateTracker {
    keys: HashMap<ScanCode, bool>,
}

impl KeyStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, scan_code: ScanCode, pressed: bool) {
        self.keys.insert(scan_code, pressed);
    }

    pub fn is_pressed(&self, scan_code: ScanCode) -> bool {
        self.keys.get(&scan_code).copied().unwrap_or(false)
    }

    pub fn pressed_count(&self) -> usize {
        self.keys.values().filter(|&&pressed| pressed).count()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_is_released() {
        let tracker = KeyStateTracker::new();
        assert!(!tracker.is_pressed(30));
    }

    #[test]
    fn tracks_press_and_release() {
        let mut tracker = KeyStateTracker::new();
        tracker.set(30, true);
        tracker.set(32, true);
        assert!(tracker.is_pressed(30));
        assert_eq!(tracker.pressed_count(), 2);

        tracker.set(30, false);
        assert!(!tracker.is_pressed(30));
        assert!(tracker.is_pressed(32));

        tracker.clear();
        assert_eq!(tracker.pressed_count(), 0);
    }
}
