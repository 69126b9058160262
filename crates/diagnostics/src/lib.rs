// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging setup shared by the nlq crates.
//!
//! Usage:
//! - Set NLQ_LOG=off (default) - no logs
//! - Set NLQ_LOG=info - load, synthesis and execution summaries
//! - Set NLQ_LOG=debug - prompts sizes, generated SQL, per-stage details
//!
//! All output goes to stderr so that query results on stdout stay clean.

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV: &str = "NLQ_LOG";

static INIT: Once = Once::new();

/// Requested log filter, parsed from the `NLQ_LOG` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Level(emit::Level),
    /// Value was not recognized; logging falls back to info
    Unknown,
}

/// Parse an `NLQ_LOG` value. Matching is case-insensitive.
pub fn parse_log_setting(value: &str) -> LogSetting {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" | "none" => LogSetting::Off,
        "debug" => LogSetting::Level(emit::Level::Debug),
        "info" => LogSetting::Level(emit::Level::Info),
        "warn" | "warning" => LogSetting::Level(emit::Level::Warn),
        "error" => LogSetting::Level(emit::Level::Error),
        _ => LogSetting::Unknown,
    }
}

/// Initialize diagnostics based on the NLQ_LOG environment variable
///
/// Call once at startup. Later calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());

        let min_level = match parse_log_setting(&value) {
            LogSetting::Off => return,
            LogSetting::Level(level) => level,
            LogSetting::Unknown => {
                // Emitter is not installed yet, so this cannot go through emit
                eprintln!("Warning: Unknown {LOG_ENV} value '{value}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min_level))
            .init();

        // The runtime must outlive every emitting thread; it lives for the process
        std::mem::forget(rt);
    });
}

/// Operation summaries: "Loaded 1024 rows", "Executed query"
///
/// Template holes are filled from explicit props, e.g.
/// `info!("Loaded {rows} rows", rows: n)`. Locals are not captured
/// through this wrapper.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Step-by-step detail: prompt sizes, SQL text, column lists
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Recoverable or policy conditions: rejected statements, config fallbacks
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Failures surfaced to the caller
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_parse_log_setting() {
        assert_eq!(parse_log_setting("off"), LogSetting::Off);
        assert_eq!(parse_log_setting(""), LogSetting::Off);
        assert_eq!(parse_log_setting("DEBUG"), LogSetting::Level(emit::Level::Debug));
        assert_eq!(parse_log_setting(" info "), LogSetting::Level(emit::Level::Info));
        assert_eq!(parse_log_setting("warning"), LogSetting::Level(emit::Level::Warn));
        assert_eq!(parse_log_setting("error"), LogSetting::Level(emit::Level::Error));
        assert_eq!(parse_log_setting("verbose"), LogSetting::Unknown);
    }

    #[test]
    fn test_macros_compile() {
        info!("Loaded {rows} rows", rows: 42);
        debug!("Debug message with {value}", value: 42);
        warn!("Warning message");
        error!("Error message");
    }

    fn describe_load(table: &str, rows: usize) {
        info!("Loaded {rows} rows into {table}", rows: rows, table: table);
        debug!(
            "Query {sql} returned {count} rows",
            sql: format!("SELECT * FROM {}", table),
            count: rows
        );
    }

    #[test]
    fn test_macros_take_locals_as_props() {
        init_diagnostics();
        describe_load("ipl_matches", 3);
    }
}
