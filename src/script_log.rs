//! Output channel for script `print`/`debug` calls.
//!
//! Everything a script prints is forwarded to the `log` facade, capped per
//! run so a print inside a tight loop cannot flood the host's console. The
//! executor resets the counter before each run.

use std::sync::atomic::{AtomicU32, Ordering};

/// Maximum number of script messages forwarded per run.
const MAX_LOGS_PER_RUN: u32 = 100;

static LOG_COUNT: AtomicU32 = AtomicU32::new(0);
static WARNED_LIMIT: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
    Warn,
}

/// Reset the per-run counter. Called by the executor before each run.
pub fn reset_run_log_count() {
    LOG_COUNT.store(0, Ordering::Relaxed);
    WARNED_LIMIT.store(0, Ordering::Relaxed);
}

/// True while the run is under its message budget.
fn can_log() -> bool {
    let count = LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= MAX_LOGS_PER_RUN {
        if WARNED_LIMIT.swap(1, Ordering::Relaxed) == 0 {
            log::warn!(
                "script log limit exceeded ({MAX_LOGS_PER_RUN} messages/run), further output dropped"
            );
        }
        false
    } else {
        true
    }
}

/// Forward one script message, respecting the per-run budget.
pub fn script_log(level: LogLevel, message: &str) {
    if !can_log() {
        return;
    }
    match level {
        LogLevel::Info => log::info!(target: "script", "{message}"),
        LogLevel::Debug => log::debug!(target: "script", "{message}"),
        LogLevel::Warn => log::warn!(target: "script", "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_limit() {
        reset_run_log_count();

        for _ in 0..MAX_LOGS_PER_RUN {
            assert!(can_log());
        }
        assert!(!can_log());

        reset_run_log_count();
        assert!(can_log());
    }
}
