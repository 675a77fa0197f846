pub mod capture;
pub mod cli;
pub mod config;
pub mod controller_state;
pub mod devices;
pub mod error;
pub mod event;
pub mod hotkey;
pub mod input_mode;
pub mod key_state;
pub mod logger;
pub mod mapping;
pub mod motion;
pub mod pipeline;
pub mod protocol;
pub mod translator;
