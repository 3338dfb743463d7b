//! Routes `tracing` events to the browser console.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

/// Configuration for the console logging subscriber
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Most verbose level that is forwarded to the console
    pub level: Level,
    /// Whether to prefix lines with the module path of the event
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: Level::WARN, show_target: false }
    }
}

impl LoggingConfig {
    /// Everything down to `DEBUG`, with module paths; for development builds.
    #[must_use]
    pub fn verbose() -> Self {
        Self { level: Level::DEBUG, show_target: true }
    }
}

/// Installs the console subscriber and the panic hook.
///
/// Safe to call repeatedly: only the first call installs a subscriber, and
/// `false` is returned when one was already in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    console_error_panic_hook::set_once();

    tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_target(config.show_target)
        .without_time()
        .with_writer(ConsoleMakeWriter)
        .try_init()
        .is_ok()
}

/// Console method an event of the given level is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleMethod {
    Error,
    Warn,
    Info,
    Log,
    Debug,
}

impl ConsoleMethod {
    fn for_level(level: Level) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG => Self::Log,
            _ => Self::Debug,
        }
    }

    fn write(self, line: &str) {
        let line = JsValue::from_str(line);
        match self {
            Self::Error => web_sys::console::error_1(&line),
            Self::Warn => web_sys::console::warn_1(&line),
            Self::Info => web_sys::console::info_1(&line),
            Self::Log => web_sys::console::log_1(&line),
            Self::Debug => web_sys::console::debug_1(&line),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event and hands it to the console when dropped.
struct ConsoleWriter {
    method: ConsoleMethod,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self { method: ConsoleMethod::for_level(level), buffer: Vec::with_capacity(128) }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if !line.is_empty() {
            self.method.write(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_map_to_console_methods() {
        assert_eq!(ConsoleMethod::for_level(Level::ERROR), ConsoleMethod::Error);
        assert_eq!(ConsoleMethod::for_level(Level::WARN), ConsoleMethod::Warn);
        assert_eq!(ConsoleMethod::for_level(Level::INFO), ConsoleMethod::Info);
        assert_eq!(ConsoleMethod::for_level(Level::DEBUG), ConsoleMethod::Log);
        assert_eq!(ConsoleMethod::for_level(Level::TRACE), ConsoleMethod::Debug);
    }

    #[test]
    fn test_default_config_is_quiet() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert!(!config.show_target);
    }
}
