//! `log` facade → browser console.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            Level::Info => web_sys::console::info_1(&msg),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger (first call wins) and set the level.
pub fn init(level: LevelFilter) {
    // Errs on repeat calls; the level still updates.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Parse `"off"`, `"error"`, … `"trace"` (case-insensitive).
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}
