use crate::capture::InputCapture;
use crate::controller_state::{ControllerSink, ControllerStateReducer};
use crate::error::CaptureError;
use crate::event::{Pressable, RawEvent, RawEventKind, Transition};
use crate::input_mode::{InputMode, InputModeSwitch};
use crate::logger::{Logger, Verbosity};
use crate::protocol::ControllerAction;
use crate::translator::TranslationEngine;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Longest wait for one raw event before mode changes get a chance to run.
/// Pending engine deadlines shorten the wait.
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// The processing loop: capture → translate → reduce → submit, one event at
/// a time on a single task. Owns every piece of mutable translation state.
pub struct Pipeline<C, S> {
    capture: C,
    engine: TranslationEngine,
    reducer: ControllerStateReducer<S>,
    switch: InputModeSwitch,
    logger: Arc<Logger>,
    mode: InputMode,
    /// Keys and buttons whose press reached the OS; their release must too.
    forwarded_presses: HashSet<Pressable>,
}

impl<C: InputCapture, S: ControllerSink> Pipeline<C, S> {
    pub fn new(
        capture: C,
        engine: TranslationEngine,
        reducer: ControllerStateReducer<S>,
        switch: InputModeSwitch,
        logger: Arc<Logger>,
    ) -> Self {
        let mode = switch.mode();
        Self { capture, engine, reducer, switch, logger, mode, forwarded_presses: HashSet::new() }
    }

    pub fn reducer(&self) -> &ControllerStateReducer<S> {
        &self.reducer
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    /// Runs until the capture side fails.
    pub async fn run(&mut self) -> Result<(), CaptureError> {
        info!("Processing loop started in {} mode", self.mode);
        loop {
            self.step().await?;
        }
    }

    /// One iteration: at most one raw event plus any timed actions.
    pub async fn step(&mut self) -> Result<(), CaptureError> {
        let mode = self.switch.mode();
        if mode != self.mode {
            self.change_mode(mode);
        }

        let event = self.capture.wait_for_event(self.wait_timeout(mode)).await?;

        if !mode.is_gamepad() {
            if let Some(event) = event {
                self.forward(&event);
            }
            return Ok(());
        }

        let now = Instant::now();
        let mut actions = self.engine.tick(now);
        let Some(event) = event else {
            self.apply(&actions);
            return Ok(());
        };

        let translation = self.engine.translate_at(&event, now);
        if self.logger.enabled(Verbosity::Medium) {
            let mut lines = describe(&event, &translation.actions, translation.pass_through);
            lines.push(format!("keys held: {}", self.engine.keys().pressed_count()));
            self.logger.log_block(title(&event), &lines);
        }
        actions.extend(translation.actions);
        self.apply(&actions);

        if translation.pass_through || self.owes_release(&event) {
            self.forward(&event);
        }
        Ok(())
    }

    fn wait_timeout(&self, mode: InputMode) -> Duration {
        match self.engine.next_deadline() {
            Some(deadline) if mode.is_gamepad() => {
                deadline.saturating_duration_since(Instant::now()).min(WAIT_TIMEOUT)
            }
            _ => WAIT_TIMEOUT,
        }
    }

    /// A release whose press was forwarded, so the OS does not keep it held.
    fn owes_release(&self, event: &RawEvent) -> bool {
        matches!(event.press(), Some((target, Transition::Up)) if self.forwarded_presses.contains(&target))
    }

    fn change_mode(&mut self, mode: InputMode) {
        info!("Input mode: {} -> {}", self.mode, mode);
        self.mode = mode;
        self.engine.reset();

        if !mode.is_gamepad() {
            self.reducer.reset();
            if let Err(e) = self.reducer.submit() {
                warn!("Neutral report failed: {}", e);
            }
        }
    }

    /// Applies every valid action, then submits once if anything changed.
    fn apply(&mut self, actions: &[ControllerAction]) {
        let mut applied = 0;
        for action in actions {
            match self.reducer.apply_action(action) {
                Ok(()) => applied += 1,
                Err(e) => warn!("Skipping {}: {}", action, e),
            }
        }
        if applied == 0 {
            return;
        }

        self.logger.log_data("Controller report", self.reducer.state().as_bytes());
        if let Err(e) = self.reducer.submit() {
            warn!("{}", e);
        }
    }

    fn forward(&mut self, event: &RawEvent) {
        if let Err(e) = self.capture.pass_through(event) {
            warn!("Pass-through failed: {}", e);
            return;
        }
        match event.press() {
            Some((target, Transition::Down)) => {
                self.forwarded_presses.insert(target);
            }
            Some((target, Transition::Up)) => {
                self.forwarded_presses.remove(&target);
            }
            None => {}
        }
    }
}

fn title(event: &RawEvent) -> &'static str {
    match event.kind {
        RawEventKind::Keyboard { .. } => "Keyboard",
        RawEventKind::MouseMove { .. } => "Mouse move",
        RawEventKind::MouseButton { .. } => "Mouse button",
        RawEventKind::MouseWheel { .. } => "Mouse wheel",
    }
}

fn describe(event: &RawEvent, actions: &[ControllerAction], pass_through: bool) -> Vec<String> {
    let mut lines = vec![format!("device={} {:?}", event.device.0, event.kind)];
    lines.extend(actions.iter().map(|a| format!("→ {}", a)));
    if actions.is_empty() {
        lines.push("→ none".to_string());
    }
    lines.push(format!("pass-through: {}", pass_through));
    lines
}
