//! Domain error types.

/// An unrecognised spelling for one of the journal's enumerated fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Top-level error type for tradejournal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("storage error on slot '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("serialization error on slot '{key}': {reason}")]
    Serialization { key: String, reason: String },

    #[error("invalid trade {field}: {reason}")]
    InvalidTrade { field: String, reason: String },

    #[error("invalid strategy: {reason}")]
    InvalidStrategy { reason: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    #[error(transparent)]
    Parse(#[from] ParseEnumError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Database { .. }
            | JournalError::DatabaseQuery { .. }
            | JournalError::Storage { .. }
            | JournalError::Serialization { .. } => 3,
            JournalError::InvalidTrade { .. }
            | JournalError::InvalidStrategy { .. }
            | JournalError::Parse(_) => 4,
            JournalError::NotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_enum_error_message_lists_choices() {
        let err = ParseEnumError {
            kind: "direction",
            value: "sideways".into(),
            expected: "Long, Short".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid direction 'sideways', expected one of: Long, Short"
        );
    }

    #[test]
    fn not_found_message() {
        let err = JournalError::NotFound {
            kind: "strategy".into(),
            id: "42".into(),
        };
        assert_eq!(err.to_string(), "strategy '42' not found");
    }
}
