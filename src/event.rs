/// Physical key code as reported by the kernel (`KEY_*`).
pub type ScanCode = u16;

/// Index of the capture device that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Down,
    Up,
}

impl Transition {
    /// evdev key value: 0 = release, 1 = press, 2 = autorepeat.
    pub fn from_key_value(value: i32) -> Self {
        if value == 0 { Transition::Up } else { Transition::Down }
    }

    pub fn is_down(self) -> bool {
        self == Transition::Down
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Side,
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAxis {
    Vertical,
    Horizontal,
}

/// Something that is pressed and later released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pressable {
    Key(ScanCode),
    Mouse(MouseButton),
}

/// One decoded keyboard/mouse stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    Keyboard { scan_code: ScanCode, transition: Transition },
    MouseMove { dx: i32, dy: i32 },
    MouseButton { button: MouseButton, transition: Transition },
    MouseWheel { ticks: i32, axis: WheelAxis },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub device: DeviceId,
    pub kind: RawEventKind,
}

impl RawEvent {
    pub fn key(device: DeviceId, scan_code: ScanCode, transition: Transition) -> Self {
        Self { device, kind: RawEventKind::Keyboard { scan_code, transition } }
    }

    pub fn mouse_move(device: DeviceId, dx: i32, dy: i32) -> Self {
        Self { device, kind: RawEventKind::MouseMove { dx, dy } }
    }

    pub fn mouse_button(device: DeviceId, button: MouseButton, transition: Transition) -> Self {
        Self { device, kind: RawEventKind::MouseButton { button, transition } }
    }

    pub fn wheel(device: DeviceId, ticks: i32, axis: WheelAxis) -> Self {
        Self { device, kind: RawEventKind::MouseWheel { ticks, axis } }
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(self.kind, RawEventKind::Keyboard { .. })
    }

    /// The key or button this event presses or releases, if any.
    pub fn press(&self) -> Option<(Pressable, Transition)> {
        match self.kind {
            RawEventKind::Keyboard { scan_code, transition } => Some((Pressable::Key(scan_code), transition)),
            RawEventKind::MouseButton { button, transition } => Some((Pressable::Mouse(button), transition)),
            RawEventKind::MouseMove { .. } | RawEventKind::MouseWheel { .. } => None,
        }
    }
}
