//! Credentials read from the environment on demand.
//!
//! Nothing here is read at startup. A credential is looked up the first time a
//! feature needs it, and its absence is an error at that point.

use crate::error::{ConfigError, ConfigResult};
use cognition_core::SecretString;
use std::env;

/// Password for the external long-term memory database.
pub const LONG_TERM_DB_PASSWORD: &str = "LONG_TERM_DB_PASSWORD";

/// Password for the vector store behind the gateway's semantic cache.
pub const CHROMA_PASSWORD: &str = "CHROMA_PASSWORD";

pub fn long_term_db_password() -> ConfigResult<SecretString> {
    read_credential(LONG_TERM_DB_PASSWORD)
}

/// Read a credential; unset and empty are both treated as missing.
pub fn read_credential(variable: &'static str) -> ConfigResult<SecretString> {
    match env::var(variable) {
        Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
        _ => Err(ConfigError::MissingCredential { variable }),
    }
}
