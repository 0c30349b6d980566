//! Custom error types for rustcinii.
//!
//! Library functions return `Result<T, CiniiError>`; the binary wraps them in
//! `anyhow` with context.

use thiserror::Error;

/// Main error type for rustcinii operations.
#[derive(Debug, Error)]
pub enum CiniiError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// CiNii returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message
        message: String,
    },

    /// Rate limited by CiNii (HTTP 429)
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Response or NDJSON line could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook writer error
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// A record is missing a field the export depends on
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record produced columns that the table's allow-list does not know
    #[error("Unknown columns for table '{table}': {}", keys.join(", "))]
    SchemaDrift {
        /// Table (sheet) name
        table: String,
        /// Offending column keys
        keys: Vec<String>,
    },
}

/// Result type alias using `CiniiError`
pub type Result<T> = std::result::Result<T, CiniiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_drift_message_lists_keys() {
        let err = CiniiError::SchemaDrift {
            table: "Main".to_string(),
            keys: vec!["foo".to_string(), "bar-baz".to_string()],
        };
        assert_eq!(err.to_string(), "Unknown columns for table 'Main': foo, bar-baz");
    }
}
