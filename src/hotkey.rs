//! Global toggle hotkey.
//!
//! The pipeline never sees the toggle key as a command; it is watched here by
//! polling the keyboard's live key state, independently of the grab.

use crate::event::ScanCode;
use crate::input_mode::{InputMode, InputModeSwitch};
use evdev::{Device, Key};
use std::io;
use std::time::Duration;
use tracing::{debug, info};

pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Something that can report whether a key is currently held.
pub trait KeySource {
    fn is_key_down(&self, key: ScanCode) -> io::Result<bool>;
}

impl KeySource for Device {
    fn is_key_down(&self, key: ScanCode) -> io::Result<bool> {
        Ok(self.get_key_state()?.contains(Key::new(key)))
    }
}

pub struct HotkeyWatcher<K> {
    source: K,
    key: ScanCode,
    switch: InputModeSwitch,
    was_down: bool,
}

impl<K: KeySource> HotkeyWatcher<K> {
    pub fn new(source: K, key: ScanCode, switch: InputModeSwitch) -> Self {
        Self { source, key, switch, was_down: false }
    }

    /// Samples the key once; toggles on the press edge only, so holding the
    /// key toggles exactly once.
    pub fn poll(&mut self) -> io::Result<Option<InputMode>> {
        let down = self.source.is_key_down(self.key)?;
        let pressed = down && !self.was_down;
        self.was_down = down;

        if !pressed {
            return Ok(None);
        }
        let mode = self.switch.toggle();
        info!("Toggle key {} pressed, input mode: {}", self.key, mode);
        Ok(Some(mode))
    }

    /// Polls every `period` until the key source fails.
    pub async fn run(mut self, period: Duration) -> io::Result<()> {
        debug!("Watching toggle key {} every {:?}", self.key, period);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.poll()?;
        }
    }
}
