use log::{Level, LevelFilter, Log, Metadata, Record, max_level, set_logger, set_max_level};

/// Overrides `LOG_LEVEL` from `flags.json`, e.g. `SHORTCUT_LOG=trace`.
const LOG_ENV: &str = "SHORTCUT_LOG";

pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 37,  // White
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        eprintln!(
            "\u{1B}[{}m[{:}] {}\u{1B}[0m",
            color,
            record.level(),
            record.args(),
        );
    }

    fn flush(&self) {}
}

/// Map the numeric `LOG_LEVEL` flag: 0 is off, 5 and above is trace.
fn level_from_flag(flag: usize) -> LevelFilter {
    match flag {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configured_level() -> LevelFilter {
    match std::env::var(LOG_ENV) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            eprintln!("Ignoring {}={:?}: not a log level", LOG_ENV, value);
            level_from_flag(config::LOG_LEVEL)
        }),
        Err(_) => level_from_flag(config::LOG_LEVEL),
    }
}

pub fn init() {
    static LOGGER: Logger = Logger;
    if let Err(err) = set_logger(&LOGGER) {
        eprintln!("Error initializing logger: {:?}", err);
        return;
    }
    set_max_level(configured_level());
}
