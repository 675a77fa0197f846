use std::sync::atomic::{AtomicU64, Ordering};
use tracing::subscriber::SetGlobalDefaultError;
use tracing::{Level, debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl Verbosity {
    /// `-v` count: 0 = Low, 1 = Medium, 2+ = High.
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 => Verbosity::Low,
            1 => Verbosity::Medium,
            _ => Verbosity::High,
        }
    }

    pub fn level(self) -> Level {
        match self {
            Verbosity::Low => Level::INFO,
            Verbosity::Medium => Level::DEBUG,
            Verbosity::High => Level::TRACE,
        }
    }
}

/// Logging handle: installs the global `tracing` subscriber and numbers the
/// per-event trace blocks. Created once in `main` and shared with the pipeline.
#[derive(Debug)]
pub struct Logger {
    verbosity: Verbosity,
    event_counter: AtomicU64,
}

impl Logger {
    /// Fails if a global subscriber is already installed.
    pub fn init(verbosity: Verbosity) -> Result<Self, SetGlobalDefaultError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(verbosity.level())
            .with_target(false)
            .with_thread_ids(verbosity >= Verbosity::High)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        let logger = Self::detached(verbosity);
        debug!("Logger initialized at {:?}", verbosity);
        Ok(logger)
    }

    /// A handle that does not touch the global subscriber.
    pub fn detached(verbosity: Verbosity) -> Self {
        Self { verbosity, event_counter: AtomicU64::new(0) }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn enabled(&self, level: Verbosity) -> bool {
        level <= self.verbosity
    }

    /// Numbered multi-line trace of one processed event (Medium and up).
    pub fn log_block(&self, title: &str, lines: &[String]) {
        if !self.enabled(Verbosity::Medium) {
            return;
        }
        let event_num = self.event_counter.fetch_add(1, Ordering::Relaxed);
        debug!("\n{}", format_block(event_num, title, lines));
    }

    /// Hex dump of raw bytes (High only).
    pub fn log_data(&self, title: &str, data: &[u8]) {
        if self.enabled(Verbosity::High) {
            trace!("{}\n  └─ {}", title, hex(data));
        }
    }

    pub fn events_logged(&self) -> u64 {
        self.event_counter.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        info!("Logger shutting down after {} traced events", self.events_logged());
    }
}

fn format_block(event_num: u64, title: &str, lines: &[String]) -> String {
    let mut out = format!("╭── Event #{}  [{}]\n", event_num, title);
    for line in lines {
        out.push_str("│   ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("╰──────────────────────────────────");
    out
}

pub fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        // Whichever call installs the subscriber, the next one must fail cleanly
        let _ = Logger::init(Verbosity::Low);
        assert!(Logger::init(Verbosity::High).is_err());
    }

    #[test]
    fn verbosity_from_flag_count() {
        assert_eq!(Verbosity::from_u8(0), Verbosity::Low);
        assert_eq!(Verbosity::from_u8(1), Verbosity::Medium);
        assert_eq!(Verbosity::from_u8(7), Verbosity::High);
        assert_eq!(Verbosity::High.level(), Level::TRACE);
    }

    #[test]
    fn blocks_are_numbered_only_when_enabled() {
        let quiet = Logger::detached(Verbosity::Low);
        quiet.log_block("key", &["a".to_string()]);
        assert_eq!(quiet.events_logged(), 0);

        let chatty = Logger::detached(Verbosity::Medium);
        chatty.log_block("key", &["a".to_string()]);
        chatty.log_block("key", &[]);
        assert_eq!(chatty.events_logged(), 2);
    }

    #[test]
    fn block_layout() {
        let block = format_block(3, "Keyboard", &["scan=57".to_string(), "A pressed".to_string()]);
        assert_eq!(
            block,
            "╭── Event #3  [Keyboard]\n│   scan=57\n│   A pressed\n╰──────────────────────────────────"
        );
    }

    #[test]
    fn hex_dump() {
        assert_eq!(hex(&[0x01, 0x10, 0xFF]), "01 10 FF");
        assert_eq!(hex(&[]), "");
    }
}
