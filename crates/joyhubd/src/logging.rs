// Terminal output for the daemon, routed through `log` so `--verbose` applies

use std::fmt::Display;

use fern::Dispatch;

/// Prefixes `message` with a wall-clock time precise enough to tell apart
/// input events arriving within the same second.
pub(crate) fn stamp(message: impl Display) -> String {
    let now = chrono::Local::now().format("%H:%M:%S%.3f");
    format!("{now} | {message}")
}

#[macro_export]
macro_rules! report {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! report_warn {
    ($($arg:tt)*) => {
        log::warn!("{}", format!($($arg)*).bright_yellow())
    };
}

#[macro_export]
macro_rules! report_error {
    ($($arg:tt)*) => {
        log::error!("{}", format!($($arg)*).bright_red())
    };
}

#[macro_export]
macro_rules! report_debug {
    ($($arg:tt)*) => {
        log::debug!("{}", format!($($arg)*).dimmed())
    };
}

/// Installs the global logger.
///
/// Every record gets the time prefix. Records from the input library also
/// carry their level so driver warnings stand out from event lines.
pub fn setup(verbose: bool, no_color: bool) -> Result<(), log::SetLoggerError> {
    let log_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    if no_color {
        colored::control::set_override(false);
    }
    Dispatch::new()
        .level(log::LevelFilter::Warn)
        .level_for("joyhubd", log_level)
        .level_for("joyhub_input", log_level)
        .format(|out, message, record| {
            if record.target().starts_with("joyhubd") {
                out.finish(format_args!("{}", stamp(message)));
            } else {
                out.finish(format_args!(
                    "{}",
                    stamp(format_args!("{} {}: {message}", record.level(), record.target()))
                ));
            }
        })
        .chain(std::io::stdout())
        .apply()
}
