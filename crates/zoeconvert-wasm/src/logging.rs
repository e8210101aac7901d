//! Forwards `log` records from the core crate to the browser console.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;
use web_sys::console;

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

        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::info_1(&message),
            Level::Debug | Level::Trace => console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger once; later calls only change the level.
pub(crate) fn install(level: LevelFilter) {
    // Errors only when a logger is already installed.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    level.trim().parse().ok()
}

/// Set the console log level: `"off"`, `"error"`, `"warn"`, `"info"`,
/// `"debug"` or `"trace"`.
///
/// # Errors
///
/// Returns an error for unknown level names.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = parse_level(level)
        .ok_or_else(|| crate::to_js_error(format!("Unknown log level: {level}")))?;
    install(filter);
    Ok(())
}
