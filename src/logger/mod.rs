use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamped, level-coloured diagnostics on stderr so stdout stays clean.
pub struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let stderr = std::io::stderr();
        let (color, reset) = if stderr.is_terminal() {
            color_codes(record.level())
        } else {
            ("", "")
        };
        let mut handle = stderr.lock();
        // nowhere left to report a failed diagnostic write
        let _ = writeln!(
            handle,
            "{}{} - {:<5} - {}{}",
            color,
            format_time(SystemTime::now()),
            record.level(),
            record.args(),
            reset
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Installs the process-wide logger. Only the binary calls this.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// UTC wall-clock time of day, `HH:MM:SS.mmm`.
fn format_time(now: SystemTime) -> String {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60,
        since_epoch.subsec_millis()
    )
}

fn color_codes(level: Level) -> (&'static str, &'static str) {
    let color = match level {
        Level::Error => "\x1b[31m", // red
        Level::Warn => "\x1b[33m",  // yellow
        Level::Info => "\x1b[32m",  // green
        Level::Debug => "\x1b[36m", // cyan
        Level::Trace => "\x1b[35m", // magenta
    };
    (color, "\x1b[0m")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn formats_time_of_day() {
        let t = UNIX_EPOCH + Duration::from_millis(((13 * 3_600 + 5 * 60 + 9) * 1_000 + 42) + 86_400_000 * 3);
        assert_eq!(format_time(t), "13:05:09.042");
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(false), LevelFilter::Info);
        assert_eq!(level_for(true), LevelFilter::Debug);
    }

    #[test]
    fn every_level_resets_colour() {
        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
            let (on, off) = color_codes(level);
            assert!(on.starts_with("\x1b["));
            assert_eq!(off, "\x1b[0m");
        }
    }
}
