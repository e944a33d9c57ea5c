//! Document naming and encoding

use serde::Serialize;

use crate::{CoreError, Result};

/// Longest accepted document name, in characters
pub const MAX_NAME_LEN: usize = 255;

/// Check that a document name is usable as a primary key
pub fn validate_name(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(CoreError::InvalidName("name is empty".to_string()));
    }

    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(CoreError::InvalidName(format!(
            "name is {} characters, limit is {}",
            len, MAX_NAME_LEN
        )));
    }

    Ok(name)
}

/// Serialize a value to the compact text form that gets stored.
///
/// Non-ASCII characters are written as-is, so the byte length of the
/// returned string is what counts against the store capacity.
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
