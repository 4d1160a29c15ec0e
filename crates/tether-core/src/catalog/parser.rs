//! Descriptor file parsing with helpful error messages
//!
//! A JSON file holds one service object or an array of them. A TOML file
//! holds one service at the top level or several `[[service]]` tables.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::service::validate::{FieldPath, validate_value_at};
use crate::service::{McpServiceConfig, SchemaError};

use super::CatalogError;

/// Parse a descriptor file, choosing the format from its extension
pub fn parse_service_file(path: &Path) -> Result<Vec<McpServiceConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read service file: {}", path.display()))?;

    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_services_json(&content),
        Some("toml") => parse_services_toml(&content),
        _ => anyhow::bail!(
            "Unsupported service file extension: {} (expected .json or .toml)",
            path.display()
        ),
    };

    parsed.with_context(|| format!("Failed to parse service file: {}", path.display()))
}

/// Parse JSON content holding one service or an array of services
pub fn parse_services_json(content: &str) -> Result<Vec<McpServiceConfig>, CatalogError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| SchemaError::Malformed(e.to_string()))?;

    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                validate_value_at(item, FieldPath::root().index(i)).map_err(CatalogError::from)
            })
            .collect(),
        single => Ok(vec![validate_value_at(&single, FieldPath::root())?]),
    }
}

/// Parse TOML content holding one service or `[[service]]` tables
pub fn parse_services_toml(content: &str) -> Result<Vec<McpServiceConfig>, CatalogError> {
    let value: Value = toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    match value.get("service") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let base = FieldPath::root().key("service").index(i);
                validate_value_at(item, base).map_err(CatalogError::from)
            })
            .collect(),
        _ => Ok(vec![validate_value_at(&value, FieldPath::root())?]),
    }
}

/// Serialize a service as pretty-printed JSON
pub fn to_json(config: &McpServiceConfig) -> Result<String> {
    serde_json::to_string_pretty(config)
        .with_context(|| format!("Failed to serialize service '{}' to JSON", config.id))
}

/// Enhance TOML parsing errors with the surrounding lines
fn enhance_toml_error(error: toml::de::Error, content: &str) -> CatalogError {
    let error_msg = error.to_string();

    let line_hint = error_msg
        .lines()
        .find(|line| line.contains("line "))
        .and_then(|line| {
            line.split("line ")
                .nth(1)
                .and_then(|s| s.split(|c: char| !c.is_ascii_digit()).next())
                .and_then(|s| s.parse::<usize>().ok())
        });

    match line_hint {
        Some(line_num) => CatalogError::Toml(format!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            error_msg
        )),
        None => CatalogError::Toml(format!("TOML parsing error: {}", error_msg)),
    }
}

fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 2).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
