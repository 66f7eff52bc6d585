//! Format detection and parsing for mapped configuration files.
//!
//! A [`ConfigSet`](crate::ConfigSet) maps each file to a context key;
//! the file extension alone decides how the contents become the JSON
//! value stored under that key.

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Formats a config set knows how to parse, keyed by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    /// Detect the format of a mapped file from its extension.
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension.to_ascii_lowercase().as_str() {
            "json" => Ok(FileFormat::Json),
            "toml" => Ok(FileFormat::Toml),
            "env" => Ok(FileFormat::Env),
            _ => Err(ConfigError::UnsupportedFormat {
                file: path.display().to_string(),
                extension: extension.to_string(),
            }),
        }
    }

    /// Parse file contents into the value stored under the mapped key.
    /// Parse failures name the offending file.
    pub fn parse(self, path: &Path, content: &str) -> Result<Value> {
        let parse_error = |detail: String| ConfigError::Parse {
            file: path.display().to_string(),
            detail,
        };

        match self {
            FileFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))
            }
            FileFormat::Toml => {
                let value: toml::Value =
                    toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
                serde_json::to_value(value).map_err(|e| parse_error(e.to_string()))
            }
            FileFormat::Env => Ok(Value::Object(parse_env(content))),
        }
    }
}

/// `KEY=value` lines. Blank lines and `#` comments are skipped,
/// surrounding quotes are stripped, unquoted booleans and integers
/// come through typed.
fn parse_env(content: &str) -> Map<String, Value> {
    let mut map = Map::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, raw)) = line.split_once('=') else {
            continue;
        };

        let raw = raw.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .or_else(|| raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')));

        let value = if let Some(text) = unquoted {
            Value::String(text.to_string())
        } else if let Ok(flag) = raw.parse::<bool>() {
            Value::Bool(flag)
        } else if let Ok(number) = raw.parse::<i64>() {
            Value::Number(number.into())
        } else {
            Value::String(raw.to_string())
        };
        map.insert(key.trim().to_string(), value);
    }
    map
}
