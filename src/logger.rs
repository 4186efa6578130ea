// SPDX-License-Identifier: MIT
//
// Copyright (C) 2020-2022 Jason Ish

use std::sync::OnceLock;

use time::macros::format_description;
use time::UtcOffset;
use tracing::Level;
use tracing_subscriber::fmt::time::OffsetTime;

static OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Capture the local UTC offset. Must be called before any threads are
/// started, as the offset can't be determined safely after that.
pub fn init_offset() {
    if let Ok(offset) = UtcOffset::current_local_offset() {
        let _ = OFFSET.set(offset);
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Convert a count of -v flags to a log level.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    if verbosity > 1 {
        Level::TRACE
    } else if verbosity > 0 {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

pub fn init_logger(level: Level) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let offset = OFFSET.get().copied().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(
        offset,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    );

    let builder = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(format!("{},hyper=off,reqwest=info", level_name(level)))
        .with_writer(std::io::stderr)
        .with_timer(timer);

    #[cfg(target_os = "windows")]
    let builder = builder.with_ansi(false);

    tracing::subscriber::set_global_default(builder.finish())
}

pub fn init_stdlog() -> Result<(), log::SetLoggerError> {
    tracing_log::LogTracer::builder()
        .with_max_level(log::LevelFilter::Info)
        .init()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(0), Level::INFO);
        assert_eq!(level_from_verbosity(1), Level::DEBUG);
        assert_eq!(level_from_verbosity(2), Level::TRACE);
        assert_eq!(level_from_verbosity(9), Level::TRACE);
    }
}
