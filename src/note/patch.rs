//! Targeted patching of a single region of a note.
//!
//! Three addressing modes are supported:
//!
//! - **Heading**: the section under a `#`..`######` heading, up to the next
//!   heading of any level.
//! - **Block**: a single line tagged with a `^block-id` anchor.
//! - **Frontmatter**: a dot-separated key path into the YAML mapping, mutated
//!   through [`DocumentStore::process_frontmatter`].
//!
//! Heading and block patches only ever look at the body after the frontmatter
//! block, and only rewrite the located region.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::vault::{frontmatter, DocumentStore, VaultError};

/// How new content is combined with the existing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOperation {
    Append,
    Prepend,
    Replace,
}

impl PatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Replace => "replace",
        }
    }
}

impl std::fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PatchOperation {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            "replace" => Ok(Self::Replace),
            _ => Err(PatchError::InvalidOperation(s.to_string())),
        }
    }
}

/// Which kind of region the patch addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Heading,
    Block,
    Frontmatter,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Block => "block",
            Self::Frontmatter => "frontmatter",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetType {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heading" => Ok(Self::Heading),
            "block" => Ok(Self::Block),
            "frontmatter" => Ok(Self::Frontmatter),
            _ => Err(PatchError::InvalidTargetType(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Heading not found: {0}")]
    HeadingNotFound(String),

    #[error("Block reference not found: ^{0}")]
    BlockNotFound(String),

    #[error("Invalid operation: {0}. Must be one of: append, prepend, replace")]
    InvalidOperation(String),

    #[error("Invalid target type: {0}. Must be one of: heading, block, frontmatter")]
    InvalidTargetType(String),

    #[error("Invalid frontmatter key path: {0:?}")]
    InvalidKeyPath(String),

    #[error("Invalid heading pattern {target:?}: {message}")]
    InvalidPattern { target: String, message: String },

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// A fully parsed patch instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub operation: PatchOperation,
    pub target_type: TargetType,
    pub target: String,
    pub content: String,
}

/// Engine-wide knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchOptions {
    /// Match heading targets literally instead of as regex syntax.
    pub literal_headings: bool,
}

/// Read `path`, apply `request`, and write the result back.
///
/// Read-modify-write is not atomic: a concurrent writer to the same path can be
/// overwritten (last write wins).
pub fn patch_document(
    store: &dyn DocumentStore,
    path: &str,
    request: &PatchRequest,
    options: PatchOptions,
) -> Result<(), PatchError> {
    let text = store.read_file(path)?;

    match request.target_type {
        TargetType::Heading => {
            let patched = patch_heading(
                &text,
                request.operation,
                &request.target,
                &request.content,
                options,
            )?;
            store.modify(path, &patched)?;
        }
        TargetType::Block => {
            let patched =
                patch_block(&text, request.operation, &request.target, &request.content)?;
            store.modify(path, &patched)?;
        }
        TargetType::Frontmatter => {
            let keys = parse_key_path(&request.target)?;
            let value = parse_literal(&request.content);
            store.process_frontmatter(path, &mut |map| {
                apply_frontmatter(map, request.operation, &keys, value.clone())
            })?;
        }
    }

    tracing::info!(
        path = %path,
        operation = %request.operation,
        target_type = %request.target_type,
        target = %request.target,
        "note patched"
    );
    Ok(())
}

/// Location of a heading section inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingSection {
    /// Byte range of the heading line itself (without its newline).
    pub heading: Range<usize>,
    /// Byte range of the section body.
    pub body: Range<usize>,
    /// The heading is the last line and has no trailing newline.
    pub heading_unterminated: bool,
}

fn heading_regex(target: &str, options: PatchOptions) -> Result<Regex, PatchError> {
    let target_pattern = if options.literal_headings {
        regex::escape(target)
    } else {
        target.to_string()
    };
    Regex::new(&format!(r"(?m)^#{{1,6}}[ \t]+(?:{target_pattern})[ \t]*\r?$")).map_err(|e| {
        PatchError::InvalidPattern {
            target: target.to_string(),
            message: e.to_string(),
        }
    })
}

fn next_heading_regex() -> &'static Regex {
    static NEXT_HEADING: OnceLock<Regex> = OnceLock::new();
    NEXT_HEADING.get_or_init(|| Regex::new(r"(?m)^#{1,6}[ \t]").expect("valid heading pattern"))
}

/// Start of the first heading line at or after `from`, or the end of the text.
/// Lines inside fenced code blocks never end a section.
fn section_end(text: &str, from: usize) -> usize {
    let mut fence: Option<&str> = None;
    let mut line_start = from;
    while line_start < text.len() {
        let line_end = text[line_start..]
            .find('\n')
            .map(|i| line_start + i + 1)
            .unwrap_or(text.len());
        let line = &text[line_start..line_end];
        let marker = ["```", "~~~"]
            .into_iter()
            .find(|m| line.trim_start().starts_with(m));
        match (fence, marker) {
            (None, Some(open)) => fence = Some(open),
            (Some(open), Some(close)) if open == close => fence = None,
            (None, None) if next_heading_regex().is_match(line) => return line_start,
            _ => {}
        }
        line_start = line_end;
    }
    text.len()
}

/// Find the first section whose heading matches `target`.
pub fn locate_heading(
    text: &str,
    target: &str,
    options: PatchOptions,
) -> Result<HeadingSection, PatchError> {
    let body_offset = frontmatter::split(text).body_offset;
    let heading = heading_regex(target, options)?
        .find_at(text, body_offset)
        .ok_or_else(|| PatchError::HeadingNotFound(target.to_string()))?;

    let heading_unterminated = heading.end() == text.len();
    let body_start = if heading_unterminated {
        heading.end()
    } else {
        heading.end() + 1
    };
    let body_end = section_end(text, body_start);

    Ok(HeadingSection {
        heading: heading.start()..heading.end(),
        body: body_start..body_end,
        heading_unterminated,
    })
}

/// Apply a heading-mode patch to raw document text.
pub fn patch_heading(
    text: &str,
    operation: PatchOperation,
    target: &str,
    content: &str,
    options: PatchOptions,
) -> Result<String, PatchError> {
    let section = locate_heading(text, target, options)?;
    let body = &text[section.body.clone()];

    let new_body = match operation {
        PatchOperation::Append => format!("{body}{content}"),
        PatchOperation::Prepend => format!("{content}{body}"),
        PatchOperation::Replace => content.to_string(),
    };

    let mut out = String::with_capacity(text.len() + content.len() + 1);
    out.push_str(&text[..section.body.start]);
    if section.heading_unterminated && !new_body.is_empty() {
        out.push('\n');
    }
    out.push_str(&new_body);
    out.push_str(&text[section.body.end..]);
    Ok(out)
}

/// Location of a block-reference line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLine {
    /// Byte range of the whole line, excluding any trailing `\r\n`.
    pub line: Range<usize>,
    /// Byte range of the content before the `^id` marker.
    pub content: Range<usize>,
}

/// Find the first line ending in `^block_id`.
///
/// The marker must start the line or follow whitespace, so `mc^2` is not a
/// reference to block `2`.
pub fn locate_block(text: &str, block_id: &str) -> Result<BlockLine, PatchError> {
    let body_offset = frontmatter::split(text).body_offset;
    let pattern = format!(
        r"(?m)^(?:(.*?)[ \t]+)?\^{}[ \t]*\r?$",
        regex::escape(block_id)
    );
    let re = Regex::new(&pattern).map_err(|e| PatchError::InvalidPattern {
        target: block_id.to_string(),
        message: e.to_string(),
    })?;

    let captures = re
        .captures_at(text, body_offset)
        .ok_or_else(|| PatchError::BlockNotFound(block_id.to_string()))?;
    let whole = captures
        .get(0)
        .ok_or_else(|| PatchError::BlockNotFound(block_id.to_string()))?;
    let content = captures
        .get(1)
        .map(|m| m.range())
        .unwrap_or(whole.start()..whole.start());

    let line_end = if text[..whole.end()].ends_with('\r') {
        whole.end() - 1
    } else {
        whole.end()
    };

    Ok(BlockLine {
        line: whole.start()..line_end,
        content,
    })
}

/// Apply a block-mode patch to raw document text.
pub fn patch_block(
    text: &str,
    operation: PatchOperation,
    block_id: &str,
    content: &str,
) -> Result<String, PatchError> {
    let block = locate_block(text, block_id)?;
    let existing = &text[block.content.clone()];

    let new_content = match operation {
        PatchOperation::Append => format!("{existing}{content}"),
        PatchOperation::Prepend => format!("{content}{existing}"),
        PatchOperation::Replace => content.to_string(),
    };
    let new_line = if new_content.is_empty() {
        format!("^{block_id}")
    } else {
        format!("{new_content} ^{block_id}")
    };

    let mut out = String::with_capacity(text.len() + content.len() + block_id.len() + 2);
    out.push_str(&text[..block.line.start]);
    out.push_str(&new_line);
    out.push_str(&text[block.line.end..]);
    Ok(out)
}

/// Split a dot-separated frontmatter key path.
pub fn parse_key_path(target: &str) -> Result<Vec<String>, PatchError> {
    let keys: Vec<String> = target.split('.').map(str::to_string).collect();
    if keys.iter().any(|k| k.trim().is_empty()) {
        return Err(PatchError::InvalidKeyPath(target.to_string()));
    }
    Ok(keys)
}

/// Interpret `content` as a JSON literal, falling back to a plain string.
pub fn parse_literal(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.to_string()))
}

/// Mutate `map` at the (non-empty) key path.
///
/// Intermediate keys that are missing or not mappings become empty mappings.
pub fn apply_frontmatter(
    map: &mut Map<String, Value>,
    operation: PatchOperation,
    keys: &[String],
    value: Value,
) {
    let Some((leaf, parents)) = keys.split_last() else {
        return;
    };

    let mut current = map;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(next) => next,
            _ => return,
        };
    }

    match operation {
        PatchOperation::Replace => {
            current.insert(leaf.clone(), value);
        }
        PatchOperation::Append | PatchOperation::Prepend => {
            let append = operation == PatchOperation::Append;
            match current.get_mut(leaf) {
                None | Some(Value::Null) => {
                    current.insert(leaf.clone(), value);
                }
                Some(Value::Array(items)) => {
                    if append {
                        items.push(value);
                    } else {
                        items.insert(0, value);
                    }
                }
                Some(Value::String(existing)) => {
                    let addition = value_as_text(&value);
                    if append {
                        existing.push_str(&addition);
                    } else {
                        existing.insert_str(0, &addition);
                    }
                }
                Some(other) => {
                    let old = other.take();
                    *other = if append {
                        Value::Array(vec![old, value])
                    } else {
                        Value::Array(vec![value, old])
                    };
                }
            }
        }
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
