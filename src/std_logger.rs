use chrono::Local;
use log::{max_level, Level, LevelFilter, Metadata, Record, SetLoggerError};

/// Timestamped stdout logger. Below `Info` only this crate's records pass,
/// so dependency chatter stays out of debug output.
pub struct StdLogger;

static LOGGER: StdLogger = StdLogger;

impl log::Log for StdLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= max_level()
      && (metadata.level() <= Level::Info || metadata.target().starts_with(env!("CARGO_CRATE_NAME")))
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let time_str = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
      println!("{0} {1:<5} {2}: {3}", time_str, record.level(), record.target(), record.args())
    }
  }

  fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER)?;
  log::set_max_level(level);

  Ok(())
}

pub fn level_for(debug: bool) -> LevelFilter {
  if debug {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  }
}
