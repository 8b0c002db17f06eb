use crate::config::LoggingConfig;
use crate::constants::{CONFIG_DIR_NAME, LOG_FILE_NAME, LOG_TIMESTAMP_FORMAT, MAX_LOG_ENTRIES};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Shared logger that keeps recent records in memory and optionally mirrors them to a file
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<Vec<String>>>,
    level: log::LevelFilter,
    log_path: Option<PathBuf>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(Vec::new())),
            level: log::LevelFilter::Info,
            log_path: None,
        }
    }

    /// Build a logger from the logging section of the configuration
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        let log_path = if config.enabled {
            Some(Self::get_log_file_path()?)
        } else {
            None
        };

        Ok(Self {
            logs: Arc::new(Mutex::new(Vec::new())),
            level: config.level_filter()?,
            log_path,
        })
    }

    /// Whether records are also written to a file
    pub fn is_enabled(&self) -> bool {
        self.log_path.is_some()
    }

    pub fn level(&self) -> log::LevelFilter {
        self.level
    }

    /// Location of the log file in the platform data directory
    pub fn get_log_file_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(LOG_FILE_NAME))
    }

    /// Add a log entry, dropping the oldest ones beyond [`MAX_LOG_ENTRIES`]
    pub fn log(&self, message: String) {
        let timestamp = Local::now().format(LOG_TIMESTAMP_FORMAT).to_string();
        let formatted_message = format!("[{}] {}", timestamp, message);

        if let Ok(mut logs) = self.logs.lock() {
            logs.push(formatted_message);
            if logs.len() > MAX_LOG_ENTRIES {
                let excess = logs.len() - MAX_LOG_ENTRIES;
                logs.drain(..excess);
            }
        }
    }

    /// Get all logs sorted by date (newest first)
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            let mut sorted_logs = logs.clone();
            sorted_logs.reverse();
            sorted_logs
        } else {
            Vec::new()
        }
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }

    /// Build the `fern` dispatch feeding this logger and, when enabled, the log file
    pub fn dispatch(&self) -> Result<fern::Dispatch> {
        let memory = self.clone();
        let mut dispatch = fern::Dispatch::new()
            .level(self.level)
            .chain(fern::Output::call(move |record| {
                memory.log(format!("{} {}: {}", record.level(), record.target(), record.args()));
            }));

        if let Some(path) = &self.log_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
            }

            let file = fern::log_file(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;

            dispatch = dispatch.chain(
                fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "[{}] {} {}: {}",
                            Local::now().format(LOG_TIMESTAMP_FORMAT),
                            record.level(),
                            record.target(),
                            message
                        ))
                    })
                    .chain(file),
            );
        }

        Ok(dispatch)
    }

    /// Install this logger as the global `log` backend
    pub fn init(&self) -> Result<()> {
        self.dispatch()?
            .apply()
            .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
