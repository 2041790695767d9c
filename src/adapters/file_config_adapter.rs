//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive; values are returned as written.

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| JournalError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, JournalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| JournalError::ConfigParse {
                file: "<inline>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const JOURNAL_INI: &str = r#"
[storage]
backend = json
dir = ./journal-data
pool_size = 2

[journal]
drawdown = equity
holding_time = explicit

[logging]
level = debug
"#;

    #[test]
    fn reads_journal_sections() {
        let adapter = FileConfigAdapter::from_string(JOURNAL_INI).unwrap();
        assert_eq!(
            adapter.get_string("storage", "backend"),
            Some("json".to_string())
        );
        assert_eq!(
            adapter.get_string("journal", "holding_time"),
            Some("explicit".to_string())
        );
        assert_eq!(adapter.get_int("storage", "pool_size", 4), 2);
        assert_eq!(adapter.get_string("logging", "level"), Some("debug".to_string()));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Storage]\nDir = Data\n").unwrap();
        assert_eq!(adapter.get_string("storage", "dir"), Some("Data".to_string()));
    }

    #[test]
    fn blank_value_is_missing() {
        let adapter = FileConfigAdapter::from_string("[storage]\ndir =\n").unwrap();
        assert_eq!(adapter.get_string("storage", "dir"), None);
        assert_eq!(adapter.get_string("nowhere", "dir"), None);
    }

    #[test]
    fn typed_getters_fall_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[storage]\npool_size = many\nratio = x\n").unwrap();
        assert_eq!(adapter.get_int("storage", "pool_size", 4), 4);
        assert_eq!(adapter.get_double("storage", "ratio", 0.5), 0.5);
        assert!(adapter.get_bool("storage", "missing", true));
    }

    #[test]
    fn bool_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[x]\na = yes\nb = Off\nc = 1\nd = maybe\n").unwrap();
        assert!(adapter.get_bool("x", "a", false));
        assert!(!adapter.get_bool("x", "b", true));
        assert!(adapter.get_bool("x", "c", false));
        assert!(!adapter.get_bool("x", "d", false));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", JOURNAL_INI).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("logging", "level"),
            Some("debug".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/journal.ini");
        assert!(matches!(result, Err(JournalError::ConfigParse { .. })));
    }
}
