//! Error types for SSSOM Core operations

use thiserror::Error;

/// Main error type for SSSOM Core operations
#[derive(Error, Debug)]
pub enum SssomError {
    /// Malformed YAML header, unknown required field, type mismatch,
    /// unparseable date/number, numeric range violation, unknown enum value,
    /// or invalid extension slot name.
    #[error("Format error: {message}")]
    Format {
        /// Error message
        message: String,
        /// Location in the source (line, byte offset, or slot name) if known
        location: Option<String>,
    },

    /// Undeclared prefix at read, parse, or write time; or an unshortenable
    /// IRI once upgraded from a soft warning to a hard error.
    #[error("Prefix error: {message}")]
    Prefix {
        /// Error message
        message: String,
        /// The offending CURIE or IRI, if available
        value: Option<String>,
    },

    /// SSSOM/T grammar failure, unknown function/filter name, or invalid
    /// call arity/signature.
    #[error("DSL parse error: {message}")]
    DslParse {
        /// Error message
        message: String,
        /// 1-based line number
        line: usize,
        /// 1-based column number
        column: usize,
    },

    /// Assignment to a mandatory ID slot with an empty value, regex
    /// compilation failure, or reference to an undefined variable.
    #[error("DSL runtime error: {message}")]
    DslRuntime {
        /// Error message
        message: String,
    },

    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SSSOM Core operations
pub type Result<T> = std::result::Result<T, SssomError>;

impl SssomError {
    /// Create a format error with no location
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            location: None,
        }
    }

    /// Create a format error with a location
    #[must_use]
    pub fn format_at(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
            location: Some(location.into()),
        }
    }

    /// Create a prefix error with no associated value
    #[must_use]
    pub fn prefix(message: impl Into<String>) -> Self {
        Self::Prefix {
            message: message.into(),
            value: None,
        }
    }

    /// Create a prefix error naming the offending CURIE or IRI
    #[must_use]
    pub fn prefix_for(message: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Prefix {
            message: message.into(),
            value: Some(value.into()),
        }
    }

    /// Create a DSL parse error at a given line/column
    #[must_use]
    pub fn dsl_parse(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::DslParse {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a DSL runtime error
    #[must_use]
    pub fn dsl_runtime(message: impl Into<String>) -> Self {
        Self::DslRuntime {
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for SssomError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::format(err.to_string())
    }
}

impl From<serde_json::Error> for SssomError {
    fn from(err: serde_json::Error) -> Self {
        Self::format(err.to_string())
    }
}

impl From<regex::Error> for SssomError {
    fn from(err: regex::Error) -> Self {
        Self::dsl_runtime(format!("invalid regular expression: {err}"))
    }
}

impl From<csv::Error> for SssomError {
    fn from(err: csv::Error) -> Self {
        Self::format(format!("TSV framing error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_carries_location() {
        let err = SssomError::format_at("unknown enum value", "row 4, col subject_type");
        match err {
            SssomError::Format { location, .. } => {
                assert_eq!(location.as_deref(), Some("row 4, col subject_type"));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn prefix_error_display_contains_value() {
        let err = SssomError::prefix_for("undeclared prefix", "FOO:0001");
        let rendered = err.to_string();
        assert!(rendered.contains("undeclared prefix"));
    }

    #[test]
    fn yaml_error_converts_to_format() {
        let bad: std::result::Result<serde_yaml::Value, _> = serde_yaml::from_str("a: [1, 2");
        let err: SssomError = bad.unwrap_err().into();
        assert!(matches!(err, SssomError::Format { .. }));
    }
}
