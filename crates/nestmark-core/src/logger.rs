//! Logging setup for the nestmark crates and binary.
//!
//! Records are printed to stderr as `[elapsed LEVEL target] message`, where
//! `target` is shortened to its last path segment. Only the `nestmark*`
//! crates log at the requested level; decoder and filesystem crates are held
//! to warnings so `-vv` stays readable. Binaries derive the level from a
//! `-v` count through [`level_from_verbosity`].

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Crate-name prefix of the targets that follow the requested level.
const OWN_TARGET: &str = "nestmark";

/// The global logger slot was already taken.
#[derive(thiserror::Error, Debug)]
#[error("a global logger is already installed")]
pub struct LoggerError(#[from] log::SetLoggerError);

fn is_own_target(target: &str) -> bool {
    target.starts_with(OWN_TARGET)
}

/// `true` when a record at `level` from `target` should be printed under
/// the `requested` filter.
fn admits(requested: LevelFilter, target: &str, level: Level) -> bool {
    let limit = if is_own_target(target) {
        requested
    } else {
        requested.min(LevelFilter::Warn)
    };
    level <= limit
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        admits(self.level, metadata.target(), metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let target = record.target().rsplit("::").next().unwrap_or_default();
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            target,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first level and succeed.
pub fn init_with_level(level: LevelFilter) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Map a repeated `-v` flag count onto a level: 0 warns, 1 informs,
/// 2 debugs, 3 or more traces.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `EnvFilter` directive used when `RUST_LOG` is unset.
#[cfg(any(feature = "tracing", test))]
fn default_directive(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    format!("warn,nestmark={level},nestmark_core={level},nestmark_eval={level}")
}

/// Install a `tracing` subscriber; `RUST_LOG` overrides `level`.
///
/// Span close events carry the time spent in each instrumented stage, so
/// `--log-json` output can be fed straight into latency tooling.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
