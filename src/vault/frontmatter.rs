//! YAML frontmatter detection, parsing, and rendering.

use std::collections::HashSet;

use serde_json::{Map, Value};

const DELIMITER: &str = "---";

/// A document split at its frontmatter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// Raw YAML between the delimiters, `None` if the document has no block.
    pub yaml: Option<&'a str>,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
    /// Byte offset where `body` starts in the original text.
    pub body_offset: usize,
}

/// Split `text` into its frontmatter block and body.
///
/// A block exists only when the very first line is `---` and a later line is
/// `---` as well. Anything else is treated as body.
pub fn split(text: &str) -> Split<'_> {
    let no_block = Split {
        yaml: None,
        body: text,
        body_offset: 0,
    };

    let Some(first_end) = text.find('\n') else {
        return no_block;
    };
    if text[..first_end].trim_end_matches('\r') != DELIMITER {
        return no_block;
    }

    let yaml_start = first_end + 1;
    let mut line_start = yaml_start;
    while line_start <= text.len() {
        let line_end = text[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(text.len());
        let line = text[line_start..line_end].trim_end_matches('\r');
        if line == DELIMITER {
            let body_offset = (line_end + 1).min(text.len());
            return Split {
                yaml: Some(&text[yaml_start..line_start]),
                body: &text[body_offset..],
                body_offset,
            };
        }
        if line_end == text.len() {
            break;
        }
        line_start = line_end + 1;
    }

    no_block
}

/// Parse a frontmatter block into a JSON mapping.
///
/// A missing or blank block yields an empty mapping. A block that is not a
/// YAML mapping is an error.
pub fn parse(yaml: Option<&str>) -> Result<Map<String, Value>, String> {
    let Some(yaml) = yaml.filter(|y| !y.trim().is_empty()) else {
        return Ok(Map::new());
    };

    let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    match serde_json::to_value(value).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(format!("expected a mapping, found {}", kind_of(&other))),
    }
}

/// Render a mapping and body back into a full document.
///
/// `original` is the block the mapping was parsed from. Keys keep their
/// original order, new keys follow, and any value the mapping still holds
/// unchanged is written back as the original YAML node, so values JSON
/// cannot carry (`.nan`, tags, non-string keys) survive the rewrite.
pub fn render(
    mapping: &Map<String, Value>,
    original: Option<&str>,
    body: &str,
) -> Result<String, String> {
    let yaml = if mapping.is_empty() {
        String::new()
    } else {
        let original = original
            .filter(|y| !y.trim().is_empty())
            .and_then(|y| serde_yaml::from_str::<serde_yaml::Value>(y).ok());
        let merged = merge_mapping(mapping, original.as_ref().and_then(|v| v.as_mapping()))?;
        serde_yaml::to_string(&merged).map_err(|e| e.to_string())?
    };
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{body}"))
}

fn merge_mapping(
    mapping: &Map<String, Value>,
    original: Option<&serde_yaml::Mapping>,
) -> Result<serde_yaml::Mapping, String> {
    let mut merged = serde_yaml::Mapping::new();
    let mut kept = HashSet::new();
    for (key, old) in original.into_iter().flatten() {
        let Some(text) = key_text(key) else {
            continue;
        };
        let Some(new) = mapping.get(&text) else {
            continue;
        };
        merged.insert(key.clone(), merge_value(new, old)?);
        kept.insert(text);
    }
    for (key, new) in mapping {
        if kept.contains(key) {
            continue;
        }
        let value = serde_yaml::to_value(new).map_err(|e| e.to_string())?;
        merged.insert(serde_yaml::Value::String(key.clone()), value);
    }
    Ok(merged)
}

fn merge_value(new: &Value, old: &serde_yaml::Value) -> Result<serde_yaml::Value, String> {
    if serde_json::to_value(old).ok().as_ref() == Some(new) {
        return Ok(old.clone());
    }
    match (new, old) {
        (Value::Object(map), serde_yaml::Value::Mapping(old_map)) => {
            Ok(serde_yaml::Value::Mapping(merge_mapping(map, Some(old_map))?))
        }
        _ => serde_yaml::to_value(new).map_err(|e| e.to_string()),
    }
}

/// The JSON key a YAML mapping key turns into when parsed.
fn key_text(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read the frontmatter mapping of a document, ignoring malformed blocks.
pub fn read_mapping(text: &str) -> Map<String, Value> {
    parse(split(text).yaml).unwrap_or_default()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
