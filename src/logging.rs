// src/logging.rs

//! Logging setup for `devloop` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `DEVLOOP_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR. Every line carries a timestamp and the name of
//! the component that emitted it, colored per the `log_color_*` settings.

use std::fmt;

use anyhow::{Result, anyhow};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::cli::LogLevel;
use crate::config::Settings;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_LEVEL_ENV: &str = "DEVLOOP_LOG";

/// Components a log line can be attributed to.
pub const COMPONENTS: &[&str] = &["main", "watcher", "build", "runner", "app"];

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup; a second call returns an error.
pub fn init_logging(cli_level: Option<LogLevel>, settings: &Settings) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(Level::INFO),
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .event_format(ComponentFormat::from_settings(settings))
        .try_init()
        .map_err(|e| anyhow!(e))
}

pub fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Map an event target (usually a module path) to its component name.
pub fn component_for_target(target: &str) -> &'static str {
    if target == "app" {
        "app"
    } else if target.starts_with("devloop::watch") {
        "watcher"
    } else if target.starts_with("devloop::exec::builder")
        || target.starts_with("devloop::exec::script")
    {
        "build"
    } else if target.starts_with("devloop::exec") {
        "runner"
    } else {
        "main"
    }
}

/// `<time> <component> | [LEVEL ]<fields>`
#[derive(Debug, Clone, Default)]
pub struct ComponentFormat {
    /// ANSI codes per component; empty when colors are off.
    colors: Vec<(&'static str, &'static str)>,
    timer: SystemTime,
}

impl ComponentFormat {
    pub fn from_settings(settings: &Settings) -> Self {
        let colors = if settings.colors_enabled() {
            COMPONENTS
                .iter()
                .filter_map(|component| settings.log_color(component).map(|code| (*component, code)))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            colors,
            timer: SystemTime,
        }
    }

    fn color(&self, component: &str) -> Option<&'static str> {
        self.colors
            .iter()
            .find(|(name, _)| *name == component)
            .map(|(_, code)| *code)
    }
}

impl<S, N> FormatEvent<S, N> for ComponentFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let component = component_for_target(metadata.target());

        self.timer.format_time(&mut writer)?;
        match self.color(component) {
            Some(code) => write!(writer, " \x1b[{code}m{component:<7}\x1b[0m| ")?,
            None => write!(writer, " {component:<7}| ")?,
        }

        if *metadata.level() != Level::INFO {
            write!(writer, "{} ", metadata.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
