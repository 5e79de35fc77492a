//! Logging for the edge shield
//!
//! Built on the standard `log` facade: code logs with `log::info!` and
//! friends, and [`init_logging`] installs a logger that renders each record
//! as JSON, logfmt or a human-readable line.
//!
//! ```rust,no_run
//! use warung_core::logging::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::production().with_context_field("service", "warung"))?;
//! log::info!("edge listening on {}", "0.0.0.0:8080");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod dedupe;
pub mod entry;
pub mod formatter;

pub use config::{LogLevel, LogOutput, LoggingConfig};
pub use dedupe::{ErrorLog, RequestTag};
pub use entry::LogEntry;
pub use formatter::LogFormat;

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the process-wide logger. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = install(config);
    });
    result
}

fn install(config: &LoggingConfig) -> anyhow::Result<()> {
    let logger = WarungLogger::new(config.clone());
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| anyhow::anyhow!("logger already installed: {}", e))?;
    log::set_max_level(config.level.into());
    Ok(())
}

struct WarungLogger {
    config: LoggingConfig,
}

impl WarungLogger {
    fn new(mut config: LoggingConfig) -> Self {
        if config.outputs.is_empty() {
            config.outputs.push(LogOutput::Stdout { format: None });
        }
        Self { config }
    }
}

impl log::Log for WarungLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        LogLevel::from(metadata.level()) <= self.config.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record, &self.config);
        for output in &self.config.outputs {
            let line = output.effective_format(&self.config.format).format_entry(&entry);
            // A closed pipe must not take the edge down
            let _ = match output {
                LogOutput::Stdout { .. } => writeln!(std::io::stdout().lock(), "{}", line),
                LogOutput::Stderr { .. } => writeln!(std::io::stderr().lock(), "{}", line),
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn logger_respects_level() {
        let logger = WarungLogger::new(LoggingConfig::default().with_level(LogLevel::Warn));
        let warn = log::Metadata::builder().level(log::Level::Warn).build();
        let debug = log::Metadata::builder().level(log::Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn empty_outputs_default_to_stdout() {
        let logger = WarungLogger::new(LoggingConfig { outputs: vec![], ..Default::default() });
        assert_eq!(logger.config.outputs, vec![LogOutput::Stdout { format: None }]);
    }
}
