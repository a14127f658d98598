// Logging bridge: the `log` facade forwarded to the engine's print function.
//
// The logger is installed once per process; the engine it prints through is
// swapped in at init and removed at shutdown, after which records go to
// stderr.

use std::sync::{Arc, RwLock};

use log::{LevelFilter, Log, Metadata, Record};

use crate::engine::{Engine, LogLevel};

static SINK: RwLock<Option<Arc<dyn Engine>>> = RwLock::new(None);
static LOGGER: EngineLogger = EngineLogger;

pub struct EngineLogger;

impl Log for EngineLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("[{}] {}", record.target(), record.args());
        let sink = SINK.read().unwrap_or_else(|e| e.into_inner());
        match sink.as_ref() {
            Some(engine) => engine.print(LogLevel::from(record.level()), &message),
            None => eprintln!("{:<5} {message}", record.level()),
        }
    }

    fn flush(&self) {}
}

/// Route `log` records to `engine`. Installs the logger on first use; a
/// logger installed by someone else is left alone.
pub fn attach(engine: Arc<dyn Engine>, level: LevelFilter) {
    *SINK.write().unwrap_or_else(|e| e.into_inner()) = Some(engine);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Stop printing through the engine.
pub fn detach() {
    SINK.write().unwrap_or_else(|e| e.into_inner()).take();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_onto_engine_severities() {
        assert_eq!(LogLevel::from(log::Level::Error), LogLevel::Error);
        assert_eq!(LogLevel::from(log::Level::Warn), LogLevel::Warning);
        assert_eq!(LogLevel::from(log::Level::Info), LogLevel::Info);
        assert_eq!(LogLevel::from(log::Level::Trace), LogLevel::Debug);
    }
}
