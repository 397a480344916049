//! Log output for the command line.
//!
//! Records go to stderr so command output on stdout stays clean. The database
//! drivers are capped at `warn` below `trace`, since their per-query logging
//! drowns out ours at `debug`. `RUST_LOG` directives are applied last and
//! override both.

use std::io::Write;

use env_logger::{Builder, Target};
use log::LevelFilter;

const DRIVER_TARGETS: [&str; 3] = ["sqlx", "mongodb", "rustls"];

/// Level applied to driver targets when the crate logs at `level`.
pub fn driver_level(level: LevelFilter) -> LevelFilter {
    if level == LevelFilter::Trace {
        level
    } else {
        level.min(LevelFilter::Warn)
    }
}

fn builder(level: LevelFilter, directives: Option<&str>) -> Builder {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{:<5} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .filter_level(level);

    for target in DRIVER_TARGETS {
        builder.filter_module(target, driver_level(level));
    }
    if let Some(directives) = directives {
        builder.parse_filters(directives);
    }
    builder
}

pub fn init_logger(level: LevelFilter) {
    let directives = std::env::var("RUST_LOG").ok();
    let logger = builder(level, directives.as_deref()).build();
    let max = logger.filter();
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max);
    }
}

pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "warning" => Some(LevelFilter::Warn),
        other => other.parse().ok(),
    }
}

/// Initialises logging from a level name. Returns false for unknown names.
pub fn set_log_level(level: &str) -> bool {
    parse_level(level).map(init_logger).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, level: Level, target: &str) -> bool {
        logger.enabled(&Metadata::builder().level(level).target(target).build())
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("WARNING"), Some(LevelFilter::Warn));
        assert_eq!(parse_level(" trace "), Some(LevelFilter::Trace));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
        assert!(!set_log_level("loud"));
    }

    #[test]
    fn drivers_stay_quiet_below_trace() {
        assert_eq!(driver_level(LevelFilter::Debug), LevelFilter::Warn);
        assert_eq!(driver_level(LevelFilter::Error), LevelFilter::Error);
        assert_eq!(driver_level(LevelFilter::Trace), LevelFilter::Trace);

        let logger = builder(LevelFilter::Debug, None).build();
        assert!(enabled(&logger, Level::Debug, "gymtrack::db::mongo"));
        assert!(!enabled(&logger, Level::Debug, "sqlx::query"));
        assert!(!enabled(&logger, Level::Info, "mongodb::command"));
        assert!(enabled(&logger, Level::Warn, "sqlx::pool"));
    }

    #[test]
    fn rust_log_directives_win() {
        let logger = builder(LevelFilter::Warn, Some("sqlx=debug,gymtrack=error")).build();
        assert!(enabled(&logger, Level::Debug, "sqlx::query"));
        assert!(!enabled(&logger, Level::Warn, "gymtrack::seed"));
    }
}
