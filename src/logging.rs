//! Logging setup for mostsimilar.
//!
//! Diagnostics go to stderr through `env_logger`; stdout carries only the
//! result table and `match` lines. When `RUST_LOG` is set it replaces the
//! filter derived from the flags below.
//!
//! | flags | `mostsimilar::*` | dependencies |
//! |-------|------------------|--------------|
//! | `-q`  | error            | error        |
//! | none  | info             | warn         |
//! | `-v`  | debug            | warn         |
//! | `-vv` | trace            | debug        |
//!
//! Dependencies (jwalk, pdf-extract and its PDF parser, docx-rs, zip) are
//! held one step back so a malformed document cannot flood the run summary.
//!
//! Without `-v`, info lines are printed bare (`CSV generated: out.csv`) and
//! warnings and errors carry their level. With `-v`, every line carries a
//! millisecond timestamp, the level and the module that logged it.

use std::env;
use std::io::{self, Write};

use env_logger::fmt::Formatter;
use env_logger::Builder;
use log::{Level, LevelFilter, Record};

/// Log target prefix of this crate's records.
const APP_TARGET: &str = "mostsimilar";

/// Level filters for this crate and for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Filters {
    app: LevelFilter,
    deps: LevelFilter,
}

fn filters(verbose: u8, quiet: bool) -> Filters {
    let (app, deps) = match (quiet, verbose) {
        (true, _) => (LevelFilter::Error, LevelFilter::Error),
        (false, 0) => (LevelFilter::Info, LevelFilter::Warn),
        (false, 1) => (LevelFilter::Debug, LevelFilter::Warn),
        (false, _) => (LevelFilter::Trace, LevelFilter::Debug),
    };
    Filters { app, deps }
}

/// Installs the stderr logger for `-v` count `verbose` and `--quiet`.
///
/// A second call keeps the first logger, so tests may run the app repeatedly.
pub fn init_logging(verbose: u8, quiet: bool) {
    let rust_log = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match &rust_log {
        Some(spec) => {
            builder.parse_filters(spec);
        }
        None => {
            let filters = filters(verbose, quiet);
            builder
                .filter_level(filters.deps)
                .filter_module(APP_TARGET, filters.app);
        }
    }

    let detailed = verbose > 0;
    builder.format(move |buf, record| write_record(buf, record, detailed));
    if builder.try_init().is_err() {
        return;
    }

    match rust_log {
        Some(spec) => log::debug!("Log filter from RUST_LOG: {spec}"),
        None => log::debug!("Log filter: {:?}", filters(verbose, quiet)),
    }
}

/// `duplicates::finder` for `mostsimilar::duplicates::finder`.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(APP_TARGET)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target)
}

fn write_record(buf: &mut Formatter, record: &Record<'_>, detailed: bool) -> io::Result<()> {
    let level = record.level();
    let style = buf.default_level_style(level);
    if detailed {
        let timestamp = buf.timestamp_millis();
        writeln!(
            buf,
            "{timestamp} {style}{level:<5}{style:#} [{}] {}",
            short_target(record.target()),
            record.args()
        )
    } else if level == Level::Info {
        writeln!(buf, "{}", record.args())
    } else {
        writeln!(buf, "{style}{level}{style:#}: {}", record.args())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters() {
        assert_eq!(
            filters(0, false),
            Filters {
                app: LevelFilter::Info,
                deps: LevelFilter::Warn
            }
        );
    }

    #[test]
    fn test_verbose_raises_app_before_deps() {
        assert_eq!(filters(1, false).app, LevelFilter::Debug);
        assert_eq!(filters(1, false).deps, LevelFilter::Warn);
        assert_eq!(filters(2, false).app, LevelFilter::Trace);
        assert_eq!(filters(2, false).deps, LevelFilter::Debug);
        assert_eq!(filters(7, false), filters(2, false));
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let quiet = Filters {
            app: LevelFilter::Error,
            deps: LevelFilter::Error,
        };
        assert_eq!(filters(0, true), quiet);
        assert_eq!(filters(3, true), quiet);
    }

    #[test]
    fn test_short_target() {
        assert_eq!(short_target("mostsimilar::duplicates::finder"), "duplicates::finder");
        assert_eq!(short_target("mostsimilar"), "mostsimilar");
        assert_eq!(short_target("jwalk::core"), "jwalk::core");
        assert_eq!(short_target("mostsimilarity::x"), "mostsimilarity::x");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(0, true);
        init_logging(2, false);
        log::info!("still logging");
    }
}
