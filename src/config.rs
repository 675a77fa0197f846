//! Persisted key/value settings and the live tuning values derived from them.

use crate::error::ConfigError;
use crate::mapping::MappingTable;
use evdev::Key;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use toml::{Table, Value};
use tracing::{debug, info, warn};

pub const KEY_MOUSE_SENSITIVITY: &str = "mouse_sensitivity";
pub const KEY_ANALOG_DEADZONE: &str = "analog_deadzone";
pub const KEY_TOGGLE_KEY: &str = "toggle_key";
pub const KEY_MOUSE_IDLE_RESET_MS: &str = "mouse_idle_reset_ms";
pub const KEY_WHEEL_PULSE_MS: &str = "wheel_pulse_ms";
pub const KEY_START_ACTIVE: &str = "start_active";
pub const KEY_MAPPINGS: &str = "mappings";

pub const DEFAULT_MOUSE_SENSITIVITY: f32 = 1.0;
pub const DEFAULT_ANALOG_DEADZONE: i32 = 3200;
pub const DEFAULT_MOUSE_IDLE_RESET_MS: i32 = 80;
pub const DEFAULT_WHEEL_PULSE_MS: i32 = 60;

// Accepted ranges for the tuning values
pub const SENSITIVITY_RANGE: (f32, f32) = (0.1, 5.0);
pub const DEADZONE_RANGE: (i32, i32) = (0, 10000);

const APP_DIR: &str = "retro-pad-emulator";
const CONFIG_FILE: &str = "config.toml";

fn read_table(path: &Path) -> Result<Option<Table>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text.parse()?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Flat TOML key/value store.
///
/// Reads never fail: a missing key yields the default, a value of the wrong
/// type is reported with `warn!` and also yields the default.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    values: Table,
}

impl ConfigStore {
    /// Loads `path`. A missing, unreadable or malformed file gives an empty
    /// store, so every setting falls back to its default.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_table(&path) {
            Ok(Some(values)) => {
                info!("Config loaded from {}", path.display());
                values
            }
            Ok(None) => {
                info!("Config file {} not found, using defaults", path.display());
                Table::new()
            }
            Err(e) => {
                warn!("Config file {} ignored, using defaults: {}", path.display(), e);
                Table::new()
            }
        };
        Self { path, values }
    }

    pub fn in_memory(path: impl Into<PathBuf>, values: Table) -> Self {
        Self { path: path.into(), values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.values.get(key) {
            None => default,
            Some(Value::Float(v)) => *v as f32,
            Some(Value::Integer(v)) => *v as f32,
            Some(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid float for {}: {:?}, using {}", key, s, default);
                default
            }),
            Some(other) => {
                warn!("Invalid float for {}: {}, using {}", key, other, default);
                default
            }
        }
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        let parsed = match self.values.get(key) {
            None => return default,
            Some(Value::Integer(v)) => i32::try_from(*v).ok(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(_) => None,
        };
        parsed.unwrap_or_else(|| {
            warn!("Invalid int for {}: {:?}, using {}", key, self.values.get(key), default);
            default
        })
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            None => default,
            Some(Value::Boolean(v)) => *v,
            Some(other) => {
                warn!("Invalid bool for {}: {}, using {}", key, other, default);
                default
            }
        }
    }

    pub fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), Value::Float(f64::from(value)));
    }

    pub fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), Value::Integer(i64::from(value)));
    }

    /// The `[mappings]` profile, if present and well-formed.
    pub fn mapping_profile(&self) -> Option<MappingTable> {
        let value = self.values.get(KEY_MAPPINGS)?;
        let parsed: Result<MappingTable, _> = value.clone().try_into();
        match parsed {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("Invalid [{}] table, keeping default mappings: {}", KEY_MAPPINGS, e);
                None
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let text = toml::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

/// Snapshot of the tuning values the translation engine uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub mouse_sensitivity: f32,
    pub analog_deadzone: i32,
    pub mouse_idle_reset: Duration,
    pub wheel_pulse: Duration,
    pub toggle_key: u16,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            mouse_sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            analog_deadzone: DEFAULT_ANALOG_DEADZONE,
            mouse_idle_reset: millis(DEFAULT_MOUSE_IDLE_RESET_MS),
            wheel_pulse: millis(DEFAULT_WHEEL_PULSE_MS),
            toggle_key: Key::KEY_F8.code(),
        }
    }
}

fn millis(ms: i32) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

impl Tuning {
    pub fn from_store(store: &ConfigStore) -> Self {
        let defaults = Tuning::default();

        let sensitivity = store.get_float(KEY_MOUSE_SENSITIVITY, defaults.mouse_sensitivity);
        let deadzone = store.get_int(KEY_ANALOG_DEADZONE, defaults.analog_deadzone);
        let idle_ms = store.get_int(KEY_MOUSE_IDLE_RESET_MS, DEFAULT_MOUSE_IDLE_RESET_MS);
        let pulse_ms = store.get_int(KEY_WHEEL_PULSE_MS, DEFAULT_WHEEL_PULSE_MS);
        let toggle = store.get_int(KEY_TOGGLE_KEY, i32::from(defaults.toggle_key));

        let tuning = Tuning {
            mouse_sensitivity: clamp_sensitivity(sensitivity),
            analog_deadzone: clamp_deadzone(deadzone),
            mouse_idle_reset: millis(idle_ms),
            wheel_pulse: millis(pulse_ms),
            toggle_key: u16::try_from(toggle).unwrap_or_else(|_| {
                warn!("Invalid {}: {}, using {}", KEY_TOGGLE_KEY, toggle, defaults.toggle_key);
                defaults.toggle_key
            }),
        };
        debug!("Tuning: {:?}", tuning);
        tuning
    }

    /// Writes the persisted part of the tuning back into `store`.
    pub fn write_to(&self, store: &mut ConfigStore) {
        store.set_float(KEY_MOUSE_SENSITIVITY, self.mouse_sensitivity);
        store.set_int(KEY_ANALOG_DEADZONE, self.analog_deadzone);
    }
}

fn clamp_sensitivity(value: f32) -> f32 {
    let (min, max) = SENSITIVITY_RANGE;
    if !value.is_finite() {
        warn!("{} is not finite, using {}", KEY_MOUSE_SENSITIVITY, DEFAULT_MOUSE_SENSITIVITY);
        return DEFAULT_MOUSE_SENSITIVITY;
    }
    if !(min..=max).contains(&value) {
        warn!("{} {} outside {}..={}, clamping", KEY_MOUSE_SENSITIVITY, value, min, max);
    }
    value.clamp(min, max)
}

fn clamp_deadzone(value: i32) -> i32 {
    let (min, max) = DEADZONE_RANGE;
    if !(min..=max).contains(&value) {
        warn!("{} {} outside {}..={}, clamping", KEY_ANALOG_DEADZONE, value, min, max);
    }
    value.clamp(min, max)
}

/// Tuning values shared between the pipeline and anything that edits them
/// live. Each field is independently atomic; no lock is taken on the hot path.
#[derive(Debug, Clone)]
pub struct SharedTuning {
    inner: Arc<TuningCells>,
}

#[derive(Debug)]
struct TuningCells {
    mouse_sensitivity: AtomicU32,
    analog_deadzone: AtomicI32,
    mouse_idle_reset_ms: AtomicU64,
    wheel_pulse_ms: AtomicU64,
}

impl SharedTuning {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            inner: Arc::new(TuningCells {
                mouse_sensitivity: AtomicU32::new(tuning.mouse_sensitivity.to_bits()),
                analog_deadzone: AtomicI32::new(tuning.analog_deadzone),
                mouse_idle_reset_ms: AtomicU64::new(tuning.mouse_idle_reset.as_millis() as u64),
                wheel_pulse_ms: AtomicU64::new(tuning.wheel_pulse.as_millis() as u64),
            }),
        }
    }

    pub fn mouse_sensitivity(&self) -> f32 {
        f32::from_bits(self.inner.mouse_sensitivity.load(Ordering::Acquire))
    }

    pub fn set_mouse_sensitivity(&self, value: f32) {
        self.inner
            .mouse_sensitivity
            .store(clamp_sensitivity(value).to_bits(), Ordering::Release);
    }

    pub fn analog_deadzone(&self) -> i32 {
        self.inner.analog_deadzone.load(Ordering::Acquire)
    }

    pub fn set_analog_deadzone(&self, value: i32) {
        self.inner.analog_deadzone.store(clamp_deadzone(value), Ordering::Release);
    }

    pub fn mouse_idle_reset(&self) -> Duration {
        Duration::from_millis(self.inner.mouse_idle_reset_ms.load(Ordering::Acquire))
    }

    pub fn wheel_pulse(&self) -> Duration {
        Duration::from_millis(self.inner.wheel_pulse_ms.load(Ordering::Acquire))
    }

    pub fn set_wheel_pulse(&self, pulse: Duration) {
        self.inner.wheel_pulse_ms.store(pulse.as_millis() as u64, Ordering::Release);
    }

    pub fn set_mouse_idle_reset(&self, idle: Duration) {
        self.inner.mouse_idle_reset_ms.store(idle.as_millis() as u64, Ordering::Release);
    }
}

impl Default for SharedTuning {
    fn default() -> Self {
        Self::new(&Tuning::default())
    }
}
