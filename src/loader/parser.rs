use serde::de::DeserializeOwned;
use std::fs;

use crate::error::Result;

/// Reads the JSON document at `file_path` into `T`.
///
/// Fails with `Error::IoError` if the file cannot be read and with
/// `Error::DeserializationError` if it does not describe a `T`.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    log::debug!("Read {} bytes from '{}'.", data.len(), file_path);

    parse_json_str(&data)
}

pub fn parse_json_str<T: DeserializeOwned>(data: &str) -> Result<T> {
    Ok(serde_json::from_str(data)?)
}
