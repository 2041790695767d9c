//! Configuration validation.
//!
//! Checks every recognised key before any storage is opened.

use std::str::FromStr;

use crate::domain::error::{JournalError, ParseEnumError};
use crate::domain::statistics::DrawdownMethod;
use crate::domain::trade::HoldingTimePolicy;
use crate::ports::config_port::ConfigPort;

labelled_enum! {
    StorageBackend ("storage backend") {
        Json => "json" | "file",
        Sqlite => "sqlite",
        Memory => "memory",
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Json
    }
}

pub const DEFAULT_DATA_DIR: &str = "journal-data";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

pub fn validate_journal_config(config: &dyn ConfigPort) -> Result<(), JournalError> {
    validate_storage(config)?;
    validate_journal(config)?;
    validate_logging(config)?;
    Ok(())
}

/// Reads an enumerated setting, `None` when the key is absent.
pub fn parse_setting<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, JournalError>
where
    T: FromStr<Err = ParseEnumError>,
{
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| JournalError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

pub fn storage_backend(config: &dyn ConfigPort) -> Result<StorageBackend, JournalError> {
    Ok(parse_setting(config, "storage", "backend")?.unwrap_or_default())
}

fn validate_storage(config: &dyn ConfigPort) -> Result<(), JournalError> {
    match storage_backend(config)? {
        StorageBackend::Sqlite => {
            if config.get_string("storage", "path").is_none() {
                return Err(JournalError::ConfigMissing {
                    section: "storage".to_string(),
                    key: "path".to_string(),
                });
            }
            let pool_size = config.get_int("storage", "pool_size", 4);
            if pool_size < 1 {
                return Err(JournalError::ConfigInvalid {
                    section: "storage".to_string(),
                    key: "pool_size".to_string(),
                    reason: "pool_size must be at least 1".to_string(),
                });
            }
        }
        StorageBackend::Json | StorageBackend::Memory => {}
    }
    Ok(())
}

fn validate_journal(config: &dyn ConfigPort) -> Result<(), JournalError> {
    parse_setting::<DrawdownMethod>(config, "journal", "drawdown")?;
    parse_setting::<HoldingTimePolicy>(config, "journal", "holding_time")?;
    Ok(())
}

fn validate_logging(config: &dyn ConfigPort) -> Result<(), JournalError> {
    match config.get_string("logging", "level") {
        Some(level) if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) => {
            Err(JournalError::ConfigInvalid {
                section: "logging".to_string(),
                key: "level".to_string(),
                reason: format!("level must be one of {}", LOG_LEVELS.join(", ")),
            })
        }
        _ => Ok(()),
    }
}
