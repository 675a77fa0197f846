//! Grabbed physical keyboard/mouse in, decoded `RawEvent`s out.
//!
//! Each grabbed device is read by its own tokio task; all of them feed one
//! channel so the pipeline sees a single ordered stream. Events the pipeline
//! decides to forward are re-emitted on pass-through uinput devices.

use crate::devices::{MOUSE_BUTTONS, NAME_PREFIX, create_passthrough_keyboard, create_passthrough_mouse};
use crate::error::CaptureError;
use crate::event::{DeviceId, MouseButton, RawEvent, RawEventKind, Transition, WheelAxis};
use evdev::{
    AttributeSetRef, Device, EventStream, EventType, InputEvent, InputEventKind, Key,
    RelativeAxisType, Synchronization, uinput::VirtualDevice,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Lets keys held while the program starts reach the OS before the grab.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

const CHANNEL_CAPACITY: usize = 256;

/// Source of raw input plus the way back to the OS.
#[allow(async_fn_in_trait)]
pub trait InputCapture {
    /// Next event, or `Ok(None)` if nothing arrived within `timeout`.
    async fn wait_for_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>, CaptureError>;

    /// Emits a synthesized event to the OS.
    fn inject(&mut self, event: &RawEvent) -> Result<(), CaptureError>;

    /// Forwards a captured event to the OS unchanged.
    fn pass_through(&mut self, event: &RawEvent) -> Result<(), CaptureError> {
        self.inject(event)
    }
}

/// Turns one device's evdev event stream into `RawEvent`s.
///
/// Relative X/Y motion is summed over a `SYN_REPORT` frame so a diagonal
/// move becomes a single `MouseMove`.
#[derive(Debug)]
pub struct EventDecoder {
    device: DeviceId,
    dx: i32,
    dy: i32,
}

impl EventDecoder {
    pub fn new(device: DeviceId) -> Self {
        Self { device, dx: 0, dy: 0 }
    }

    pub fn decode(&mut self, event: &InputEvent) -> Option<RawEvent> {
        let value = event.value();
        match event.kind() {
            InputEventKind::Key(key) => {
                let transition = Transition::from_key_value(value);
                Some(match mouse_button(key) {
                    Some(button) => RawEvent::mouse_button(self.device, button, transition),
                    None => RawEvent::key(self.device, key.code(), transition),
                })
            }
            InputEventKind::RelAxis(axis) => match axis {
                RelativeAxisType::REL_X => {
                    self.dx = self.dx.saturating_add(value);
                    None
                }
                RelativeAxisType::REL_Y => {
                    self.dy = self.dy.saturating_add(value);
                    None
                }
                RelativeAxisType::REL_WHEEL if value != 0 => {
                    Some(RawEvent::wheel(self.device, value, WheelAxis::Vertical))
                }
                RelativeAxisType::REL_HWHEEL if value != 0 => {
                    Some(RawEvent::wheel(self.device, value, WheelAxis::Horizontal))
                }
                _ => None,
            },
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) => self.flush_motion(),
            InputEventKind::Synchronization(Synchronization::SYN_DROPPED) => {
                warn!("Device {} dropped events, discarding partial motion", self.device.0);
                self.dx = 0;
                self.dy = 0;
                None
            }
            _ => None,
        }
    }

    fn flush_motion(&mut self) -> Option<RawEvent> {
        let (dx, dy) = (self.dx, self.dy);
        self.dx = 0;
        self.dy = 0;
        if dx == 0 && dy == 0 {
            None
        } else {
            Some(RawEvent::mouse_move(self.device, dx, dy))
        }
    }
}

fn mouse_button(key: Key) -> Option<MouseButton> {
    const BUTTONS: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Side,
        MouseButton::Extra,
    ];
    MOUSE_BUTTONS
        .iter()
        .position(|k| *k == key)
        .map(|i| BUTTONS[i])
}

fn mouse_button_key(button: MouseButton) -> Key {
    match button {
        MouseButton::Left => Key::BTN_LEFT,
        MouseButton::Right => Key::BTN_RIGHT,
        MouseButton::Middle => Key::BTN_MIDDLE,
        MouseButton::Side => Key::BTN_SIDE,
        MouseButton::Extra => Key::BTN_EXTRA,
    }
}

/// evdev events that reproduce `event`, without the trailing `SYN_REPORT`.
pub fn encode(event: &RawEvent) -> Vec<InputEvent> {
    let key_value = |t: Transition| i32::from(t.is_down());
    match event.kind {
        RawEventKind::Keyboard { scan_code, transition } => {
            vec![InputEvent::new(EventType::KEY, scan_code, key_value(transition))]
        }
        RawEventKind::MouseButton { button, transition } => {
            vec![InputEvent::new(EventType::KEY, mouse_button_key(button).code(), key_value(transition))]
        }
        RawEventKind::MouseMove { dx, dy } => {
            let mut events = Vec::with_capacity(2);
            if dx != 0 {
                events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx));
            }
            if dy != 0 {
                events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy));
            }
            events
        }
        RawEventKind::MouseWheel { ticks, axis } => {
            let code = match axis {
                WheelAxis::Vertical => RelativeAxisType::REL_WHEEL,
                WheelAxis::Horizontal => RelativeAxisType::REL_HWHEEL,
            };
            vec![InputEvent::new(EventType::RELATIVE, code.0, ticks)]
        }
    }
}

/// Grabbed evdev devices plus the uinput devices used to forward events.
pub struct EvdevCapture {
    events: mpsc::Receiver<RawEvent>,
    readers: Vec<JoinHandle<()>>,
    keyboard_out: VirtualDevice,
    mouse_out: VirtualDevice,
}

impl EvdevCapture {
    /// Creates the pass-through devices, waits [`SETTLE_DELAY`], then grabs
    /// `keyboard` and `mouse` (once, if they are the same node).
    pub async fn open(keyboard: &Path, mouse: &Path) -> Result<Self, CaptureError> {
        let keyboard_out = create_passthrough_keyboard()?;
        let mouse_out = create_passthrough_mouse()?;
        debug!("Pass-through keyboard and mouse created");

        tokio::time::sleep(SETTLE_DELAY).await;

        let mut paths = vec![keyboard];
        if mouse != keyboard {
            paths.push(mouse);
        }

        let (tx, events) = mpsc::channel(CHANNEL_CAPACITY);
        let mut readers = Vec::with_capacity(paths.len());
        for (index, path) in paths.into_iter().enumerate() {
            let id = DeviceId(index as u16);
            let mut device = Device::open(path)?;
            device.grab()?;
            info!(
                "Grabbed {} ({}) as device {}",
                path.display(),
                device.name().unwrap_or("unnamed"),
                id.0
            );
            let stream = device.into_event_stream()?;
            readers.push(tokio::spawn(read_device(stream, id, tx.clone())));
        }

        Ok(Self { events, readers, keyboard_out, mouse_out })
    }
}

async fn read_device(mut stream: EventStream, id: DeviceId, tx: mpsc::Sender<RawEvent>) {
    let mut decoder = EventDecoder::new(id);
    loop {
        match stream.next_event().await {
            Ok(event) => {
                let Some(raw) = decoder.decode(&event) else { continue };
                if tx.send(raw).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                error!("Reading device {} failed: {}", id.0, e);
                return;
            }
        }
    }
}

impl InputCapture for EvdevCapture {
    async fn wait_for_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>, CaptureError> {
        match tokio::time::timeout(timeout, self.events.recv()).await {
            Ok(Some(event)) => Ok(Some(event)),
            Ok(None) => Err(CaptureError::Closed),
            Err(_) => Ok(None),
        }
    }

    fn inject(&mut self, event: &RawEvent) -> Result<(), CaptureError> {
        let out = if event.is_keyboard() { &mut self.keyboard_out } else { &mut self.mouse_out };
        trace!("Forwarding {:?}", event.kind);
        out.emit(&encode(event))?;
        Ok(())
    }
}

impl Drop for EvdevCapture {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
        info!("Input devices released");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Keyboard,
    Mouse,
    Other,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Keyboard => write!(f, "keyboard"),
            DeviceClass::Mouse => write!(f, "mouse"),
            DeviceClass::Other => write!(f, "other"),
        }
    }
}

/// Keyboard = has `KEY_A` and `KEY_SPACE`; mouse = has `REL_X`, `REL_Y` and `BTN_LEFT`.
pub fn classify(
    keys: Option<&AttributeSetRef<Key>>,
    rel_axes: Option<&AttributeSetRef<RelativeAxisType>>,
) -> DeviceClass {
    let has_key = |k| keys.is_some_and(|set| set.contains(k));
    let has_rel = |r| rel_axes.is_some_and(|set| set.contains(r));

    if has_key(Key::KEY_A) && has_key(Key::KEY_SPACE) {
        DeviceClass::Keyboard
    } else if has_rel(RelativeAxisType::REL_X) && has_rel(RelativeAxisType::REL_Y) && has_key(Key::BTN_LEFT) {
        DeviceClass::Mouse
    } else {
        DeviceClass::Other
    }
}

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub class: DeviceClass,
}

/// Every readable input device, except the ones this program created.
pub fn list_devices() -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = evdev::enumerate()
        .map(|(path, device)| DeviceInfo {
            class: classify(device.supported_keys(), device.supported_relative_axes()),
            name: device.name().unwrap_or("unnamed").to_string(),
            path,
        })
        .filter(|info| !info.name.starts_with(NAME_PREFIX))
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices
}

/// First device of `class`, by path order.
pub fn discover(class: DeviceClass) -> Result<PathBuf, CaptureError> {
    let found = list_devices().into_iter().find(|info| info.class == class);
    match found {
        Some(info) => {
            info!("Auto-selected {} {} ({})", class, info.path.display(), info.name);
            Ok(info.path)
        }
        None => Err(CaptureError::NoDevice(match class {
            DeviceClass::Keyboard => "keyboard",
            DeviceClass::Mouse => "mouse",
            DeviceClass::Other => "input",
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::AttributeSet;

    const DEV: DeviceId = DeviceId(3);

    fn key(code: Key, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, code.code(), value)
    }

    fn rel(axis: RelativeAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::RELATIVE, axis.0, value)
    }

    fn syn() -> InputEvent {
        InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0)
    }

    #[test]
    fn keys_decode_with_autorepeat_as_down() {
        let mut decoder = EventDecoder::new(DEV);
        let space = Key::KEY_SPACE.code();
        assert_eq!(decoder.decode(&key(Key::KEY_SPACE, 1)), Some(RawEvent::key(DEV, space, Transition::Down)));
        assert_eq!(decoder.decode(&key(Key::KEY_SPACE, 2)), Some(RawEvent::key(DEV, space, Transition::Down)));
        assert_eq!(decoder.decode(&key(Key::KEY_SPACE, 0)), Some(RawEvent::key(DEV, space, Transition::Up)));
    }

    #[test]
    fn mouse_buttons_are_not_keys() {
        let mut decoder = EventDecoder::new(DEV);
        assert_eq!(
            decoder.decode(&key(Key::BTN_RIGHT, 1)),
            Some(RawEvent::mouse_button(DEV, MouseButton::Right, Transition::Down))
        );
        assert_eq!(
            decoder.decode(&key(Key::BTN_EXTRA, 0)),
            Some(RawEvent::mouse_button(DEV, MouseButton::Extra, Transition::Up))
        );
    }

    #[test]
    fn motion_is_summed_per_frame() {
        let mut decoder = EventDecoder::new(DEV);
        assert_eq!(decoder.decode(&rel(RelativeAxisType::REL_X, 3)), None);
        assert_eq!(decoder.decode(&rel(RelativeAxisType::REL_Y, -2)), None);
        assert_eq!(decoder.decode(&rel(RelativeAxisType::REL_X, 4)), None);
        assert_eq!(decoder.decode(&syn()), Some(RawEvent::mouse_move(DEV, 7, -2)));
        // Empty frame: no zero move
        assert_eq!(decoder.decode(&syn()), None);
    }

    #[test]
    fn dropped_frame_discards_motion() {
        let mut decoder = EventDecoder::new(DEV);
        decoder.decode(&rel(RelativeAxisType::REL_X, 10));
        let dropped = InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_DROPPED.0, 0);
        assert_eq!(decoder.decode(&dropped), None);
        assert_eq!(decoder.decode(&syn()), None);
    }

    #[test]
    fn wheels_decode_immediately() {
        let mut decoder = EventDecoder::new(DEV);
        assert_eq!(
            decoder.decode(&rel(RelativeAxisType::REL_WHEEL, -1)),
            Some(RawEvent::wheel(DEV, -1, WheelAxis::Vertical))
        );
        assert_eq!(
            decoder.decode(&rel(RelativeAxisType::REL_HWHEEL, 2)),
            Some(RawEvent::wheel(DEV, 2, WheelAxis::Horizontal))
        );
        // REL_WHEEL_HI_RES
        assert_eq!(decoder.decode(&rel(RelativeAxisType(0x0b), 120)), None);
    }

    #[test]
    fn misc_events_are_dropped() {
        let mut decoder = EventDecoder::new(DEV);
        let scan = InputEvent::new(EventType::MISC, 4, 0x70004);
        assert_eq!(decoder.decode(&scan), None);
    }

    #[test]
    fn encode_reproduces_the_event() {
        let events = encode(&RawEvent::key(DEV, Key::KEY_J.code(), Transition::Down));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), InputEventKind::Key(Key::KEY_J));
        assert_eq!(events[0].value(), 1);

        let events = encode(&RawEvent::mouse_move(DEV, 0, -5));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), InputEventKind::RelAxis(RelativeAxisType::REL_Y));
        assert_eq!(events[0].value(), -5);

        let events = encode(&RawEvent::mouse_button(DEV, MouseButton::Middle, Transition::Up));
        assert_eq!(events[0].kind(), InputEventKind::Key(Key::BTN_MIDDLE));
        assert_eq!(events[0].value(), 0);

        let events = encode(&RawEvent::wheel(DEV, 1, WheelAxis::Horizontal));
        assert_eq!(events[0].kind(), InputEventKind::RelAxis(RelativeAxisType::REL_HWHEEL));
    }

    #[test]
    fn decoded_then_encoded_button_keeps_its_code() {
        let mut decoder = EventDecoder::new(DEV);
        for button in MOUSE_BUTTONS {
            let raw = decoder.decode(&key(button, 1)).unwrap();
            assert_eq!(encode(&raw)[0].code(), button.code());
        }
    }

    #[test]
    fn classification() {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::KEY_A);
        keys.insert(Key::KEY_SPACE);
        assert_eq!(classify(Some(&*keys), None), DeviceClass::Keyboard);

        let mut buttons = AttributeSet::<Key>::new();
        buttons.insert(Key::BTN_LEFT);
        let mut rel_axes = AttributeSet::<RelativeAxisType>::new();
        rel_axes.insert(RelativeAxisType::REL_X);
        rel_axes.insert(RelativeAxisType::REL_Y);
        assert_eq!(classify(Some(&*buttons), Some(&*rel_axes)), DeviceClass::Mouse);

        // Touchpad-like: motion without buttons
        assert_eq!(classify(None, Some(&*rel_axes)), DeviceClass::Other);
        assert_eq!(classify(None, None), DeviceClass::Other);
    }
}
