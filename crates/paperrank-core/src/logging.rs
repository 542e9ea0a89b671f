//! Logging utilities with indicatif integration and an optional log file

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use indicatif::MultiProgress;

/// ANSI color code and padded label for a log level.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let label = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    if !color {
        return ("", label, "");
    }
    let ansi = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (ansi, label, "\x1b[0m")
}

/// Append-only log file shared by both logger paths.
type LogFile = Arc<Mutex<File>>;

/// Writer that copies every log line to stderr and, if set, the log file.
struct TeeWriter {
    file: Option<LogFile>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &self.file {
            file.lock().unwrap().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &self.file {
            file.lock().unwrap().flush()?;
        }
        Ok(())
    }
}

/// Logger that prints through indicatif MultiProgress to avoid mixing with progress bars.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
    file: Option<LogFile>,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self {
            inner,
            multi,
            file: None,
        }
    }

    fn with_file(mut self, file: Option<LogFile>) -> Self {
        self.file = file;
        self
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            // TTY path: always has color (IndicatifLogger only used in TTY mode)
            let (pre, label, post) = level_style(record.level(), true);
            let line = format!("[{pre}{label}{post}] {}", record.args());
            self.multi.suspend(|| eprintln!("{line}"));

            if let Some(file) = &self.file {
                let (_, label, _) = level_style(record.level(), false);
                let _ = writeln!(file.lock().unwrap(), "[{label}] {}", record.args());
            }
        }
    }

    fn flush(&self) {
        self.inner.flush();
        if let Some(file) = &self.file {
            let _ = file.lock().unwrap().flush();
        }
    }
}

/// Initialize logging with optional TTY mode (indicatif integration).
///
/// When `log_file` is given, every emitted line is also appended there.
pub fn init_logging(
    quiet: bool,
    debug: bool,
    multi: Option<&MultiProgress>,
    log_file: Option<&Path>,
) -> io::Result<()> {
    let default_level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let file = log_file
        .map(|path| File::options().create(true).append(true).open(path))
        .transpose()?
        .map(|f| Arc::new(Mutex::new(f)));

    if let Some(multi) = multi {
        let logger = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(default_level),
        )
        .format_timestamp_millis()
        .build();
        let max_level = logger.filter();

        let logger = IndicatifLogger::new(logger, multi.clone()).with_file(file);
        log::set_boxed_logger(Box::new(logger)).map_err(io::Error::other)?;
        log::set_max_level(max_level);
    } else {
        // Non-TTY: no ANSI colors, plain lines for log aggregation
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format(|buf, record| {
                let (_, label, _) = level_style(record.level(), false);
                writeln!(buf, "[{label}] {}", record.args())
            })
            .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })))
            .try_init()
            .map_err(io::Error::other)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels_are_padded() {
        for level in [
            log::Level::Error,
            log::Level::Warn,
            log::Level::Info,
            log::Level::Debug,
            log::Level::Trace,
        ] {
            let (pre, label, post) = level_style(level, false);
            assert_eq!(label.len(), 5);
            assert!(pre.is_empty() && post.is_empty());
        }
    }

    #[test]
    fn colored_labels_reset() {
        let (pre, _, post) = level_style(log::Level::Warn, true);
        assert_eq!(pre, "\x1b[33m");
        assert_eq!(post, "\x1b[0m");
    }

    #[test]
    fn tee_writer_copies_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let file = Arc::new(Mutex::new(File::create(&path).unwrap()));

        let mut tee = TeeWriter {
            file: Some(file.clone()),
        };
        tee.write_all(b"[INFO ] crawl started\n").unwrap();
        tee.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[INFO ] crawl started\n");
    }
}
