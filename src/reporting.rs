//! Utilities for logging and error reporting.

use std::{io::Write, path::PathBuf, str::FromStr};

use eyre::Context;
use tracing_appender::{
    non_blocking::{NonBlockingBuilder, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt};

use crate::fs;

/// Name of the log files, before the rotation date suffix.
const LOG_FILE_PREFIX: &str = "phone-tracker.log";

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "warn,phone_tracker=debug";

/// Implements [std::io::Write] to write `tracing` messages to stderr and/or a rolling log file.
/// Stdout is left to the command output.
struct ReportWriter {
    stderr: bool,
    log_file_writer: Option<RollingFileAppender>,
}

impl Write for ReportWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.stderr {
            std::io::stderr().write_all(buf)?;
        }

        match &mut self.log_file_writer {
            Some(writer) => writer.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.stderr {
            std::io::stderr().flush()?;
        }

        if let Some(writer) = &mut self.log_file_writer {
            writer.flush()?;
        }

        Ok(())
    }
}

/// Keeps the non-blocking log writer alive, dropping it flushes the remaining messages.
pub struct ReportingGuard {
    _writer: WorkerGuard,
}

/// Options for [`setup_reporting()`].
pub struct ReportingOptions {
    /// Log files are written to `<data_dir>/log`.
    pub data_dir: PathBuf,
    /// How often to rotate the log files.
    pub log_rotation: Rotation,
    /// Whether to also write log messages to stderr.
    pub stderr: bool,
}

impl ReportingOptions {
    fn log_dir(&self) -> PathBuf {
        self.data_dir.join("log")
    }
}

/// Set up `tracing` logging to the log file (and optionally stderr), and install the
/// `color-eyre` error report and panic hooks.
pub fn setup_reporting(options: &ReportingOptions) -> eyre::Result<ReportingGuard> {
    let log_dir = options.log_dir();
    fs::create_dir_if_not_exists(&log_dir).wrap_err("Unable to create log file directory")?;

    let report_writer = ReportWriter {
        stderr: options.stderr,
        log_file_writer: Some(RollingFileAppender::new(
            options.log_rotation.clone(),
            log_dir,
            LOG_FILE_PREFIX,
        )),
    };

    let (non_blocking_writer, report_writer_guard) = NonBlockingBuilder::default()
        .buffered_lines_limit(1000)
        .lossy(false)
        .finish(report_writer);

    let rust_log_env: String =
        std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(tracing_subscriber::EnvFilter::from_str(rust_log_env.as_str()).unwrap_or_default())
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .wrap_err("Unable to set global tracing subscriber")?;

    color_eyre::install()?;

    Ok(ReportingGuard {
        _writer: report_writer_guard,
    })
}
