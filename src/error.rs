use thiserror::Error;

/// Failures of the input-capture side (grabbed devices and pass-through devices).
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("input device I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no {0} device found")]
    NoDevice(&'static str),

    #[error("all capture readers stopped")]
    Closed,
}

/// The virtual controller rejected a report.
#[derive(Debug, Error)]
#[error("virtual controller rejected the report: {0}")]
pub struct SubmitError(#[from] pub std::io::Error);

/// An action that does not fit the controller state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("axis index {0} out of range (0-3)")]
    InvalidAxis(u8),

    #[error("trigger index {0} out of range (0-1)")]
    InvalidTrigger(u8),

    #[error("trigger value {0} out of range (0-255)")]
    TriggerOutOfRange(i32),
}

#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("axis index {0} out of range (0-3)")]
    InvalidAxis(u8),

    #[error("trigger index {0} out of range (0-1)")]
    InvalidTrigger(u8),

    #[error("axis magnitude {0} out of range (1-32767)")]
    InvalidMagnitude(i32),

    #[error("axis pair uses key {0} for both directions")]
    SameKeyPair(u16),

    #[error("key {0} is mapped more than once")]
    DuplicateKey(u16),

    #[error("mouse sensitivity {0} must be finite and positive")]
    InvalidSensitivity(f32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Fatal startup failures: the pipeline is never entered.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("input capture initialization failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("virtual controller initialization failed: {0}")]
    Controller(#[source] std::io::Error),

    #[error("configuration failed: {0}")]
    Config(#[from] ConfigError),
}
