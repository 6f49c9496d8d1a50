//! Name validation for memory providers.
//!
//! Provider names come from configuration files and end up as registry keys
//! and in log lines, so they are restricted to a plain identifier alphabet.

use thiserror::Error;

/// Validation rules for string identifiers
#[derive(Debug, Clone, Copy)]
pub struct NameRules {
    /// Maximum allowed length in characters
    pub max_length: usize,
    /// Whether `.` may appear in the name
    pub allow_dots: bool,
}

impl NameRules {
    /// Provider names: alphanumeric, `_`, `-`; at most 64 characters.
    pub const PROVIDER_NAME: Self = Self {
        max_length: 64,
        allow_dots: false,
    };

    /// Validate a string against these rules
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The accepted name, trimmed
    /// * `Err(NameError)` - Why the name was rejected
    pub fn validate(&self, input: &str) -> Result<String, NameError> {
        let processed = input.trim();

        if processed.is_empty() {
            return Err(NameError::Empty);
        }

        let length = processed.chars().count();
        if length > self.max_length {
            return Err(NameError::TooLong {
                length,
                max: self.max_length,
            });
        }

        if processed.contains("..") {
            return Err(NameError::PathTraversal);
        }

        if let Some(ch) = processed.chars().find(|&ch| !self.accepts(ch)) {
            return Err(NameError::InvalidChar {
                char: ch,
                input: processed.to_string(),
            });
        }

        Ok(processed.to_string())
    }

    fn accepts(&self, ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_' || ch == '-' || (ch == '.' && self.allow_dots)
    }
}

/// Errors that can occur during name validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },

    #[error("name '{input}' contains invalid character '{char}'")]
    InvalidChar { char: char, input: String },

    #[error("name cannot contain '..'")]
    PathTraversal,
}
