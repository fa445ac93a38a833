//! Configuration parsing
//!
//! TOML is the primary format, JSON is accepted as well. Parse errors carry
//! the line and column of the offending input, plus a hint for the mistakes
//! sink configs tend to contain.

use std::path::Path;

use contracts::{ContractError, SinkerBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (preferred)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Infer the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "cannot determine config format of {}: expected .toml or .json",
                path.display()
            ))
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!(
                "unsupported config format: .{ext} (expected .toml or .json)"
            ))
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// Parse a TOML configuration
pub fn parse_toml(content: &str) -> Result<SinkerBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| {
        let location = e.span().map(|span| line_column(content, span.start));
        let message = e.message().to_string();
        parse_error(ConfigFormat::Toml, &message, location, e)
    })
}

/// Parse a JSON configuration
pub fn parse_json(content: &str) -> Result<SinkerBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| {
        let location = (e.line() > 0).then(|| (e.line(), e.column()));
        let message = e.to_string();
        parse_error(ConfigFormat::Json, &message, location, e)
    })
}

/// Parse a configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<SinkerBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

fn parse_error<E>(
    format: ConfigFormat,
    message: &str,
    location: Option<(usize, usize)>,
    source: E,
) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let mut text = match location {
        Some((line, column)) => format!(
            "{} parse error at line {line}, column {column}: {}",
            format.name(),
            message.trim()
        ),
        None => format!("{} parse error: {}", format.name(), message.trim()),
    };
    if let Some(hint) = hint(format, message) {
        text.push_str(" (hint: ");
        text.push_str(hint);
        text.push(')');
    }

    ContractError::ConfigParse {
        message: text,
        source: Some(Box::new(source)),
    }
}

/// Known config mistakes, recognised from the deserializer's message
fn hint(format: ConfigFormat, message: &str) -> Option<&'static str> {
    if message.contains("unknown variant") && message.contains("memory") {
        return Some("store.backend supports only \"memory\"");
    }
    if message.contains("invalid type: map, expected a sequence") {
        return Some(match format {
            ConfigFormat::Toml => "declare each sink as its own [[sinks]] table",
            ConfigFormat::Json => "\"sinks\" is an array of objects",
        });
    }
    if message.contains("missing field `destination_table`")
        || message.contains("missing field `source_table`")
    {
        return Some("every sink needs source_table and destination_table");
    }
    None
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content.as_bytes()[..offset.min(content.len())];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    (line, before.len() - line_start + 1)
}
