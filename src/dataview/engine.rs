//! Built-in query engine that evaluates DQL against note frontmatter.

use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Map, Value};

use super::query::{self, CompareOp, Condition, Query, QueryKind, Source};
use super::{QueryEngine, QueryError, QueryLanguage, Validation};
use crate::vault::{frontmatter, DocumentStore, VaultError};

/// Evaluates queries by scanning every markdown note in a store.
pub struct MetadataQueryEngine {
    store: Arc<dyn DocumentStore>,
}

/// A note as seen by the query engine: its path, frontmatter plus the
/// implicit `file` object, and raw text.
struct Page {
    path: String,
    fields: Value,
    text: String,
}

impl MetadataQueryEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn pages(&self, source: &Source) -> Result<Vec<Page>, VaultError> {
        let mut pages = Vec::new();
        for path in self.store.list()? {
            if !path.ends_with(".md") || !in_folder(&path, source) {
                continue;
            }
            let text = match self.store.read(&path) {
                Ok(text) => text,
                Err(VaultError::NotText(_)) => continue,
                Err(e) => return Err(e),
            };

            let mut fields = frontmatter::read_mapping(&text);
            if let Source::Tag(tag) = source {
                if !has_tag(&fields, tag) {
                    continue;
                }
            }
            fields.insert("file".into(), file_object(&path));
            pages.push(Page {
                path,
                fields: Value::Object(fields),
                text,
            });
        }
        Ok(pages)
    }

    fn execute(&self, query: &Query) -> Result<Value, QueryError> {
        let mut pages = self.pages(&query.source)?;

        if let Some(condition) = &query.condition {
            pages.retain(|page| matches_condition(&page.fields, condition));
        }
        if let Some(sort) = &query.sort {
            pages.sort_by(|a, b| {
                let ordering = compare_fields(
                    lookup(&a.fields, &sort.field),
                    lookup(&b.fields, &sort.field),
                );
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        if let Some(limit) = query.limit {
            pages.truncate(limit);
        }

        let result = match &query.kind {
            QueryKind::List => json!({
                "type": "list",
                "values": pages.iter().map(|p| p.path.clone()).collect::<Vec<_>>(),
            }),
            QueryKind::Table(columns) => {
                let mut headers = vec![Value::String("File".into())];
                headers.extend(columns.iter().cloned().map(Value::String));
                let rows: Vec<Value> = pages
                    .iter()
                    .map(|page| {
                        let mut row = vec![Value::String(page.path.clone())];
                        row.extend(
                            columns
                                .iter()
                                .map(|c| lookup(&page.fields, c).cloned().unwrap_or(Value::Null)),
                        );
                        Value::Array(row)
                    })
                    .collect();
                json!({"type": "table", "headers": headers, "values": rows})
            }
            QueryKind::Task => {
                let tasks: Vec<Value> = pages
                    .iter()
                    .flat_map(|page| collect_tasks(&page.path, &page.text))
                    .collect();
                json!({"type": "task", "values": tasks})
            }
        };

        tracing::debug!(kind = query.kind.as_str(), "dataview query executed");
        Ok(result)
    }
}

impl QueryEngine for MetadataQueryEngine {
    fn query(&self, source: &str) -> Result<Value, QueryError> {
        let query = query::parse(source)?;
        self.execute(&query)
    }

    fn validate(&self, source: &str, language: QueryLanguage) -> Validation {
        match language {
            QueryLanguage::Js => Validation::invalid(
                language,
                "JavaScript queries are not supported; only DQL is evaluated",
            ),
            QueryLanguage::Dql => match query::parse(source) {
                Ok(_) => Validation::ok(language),
                Err(e) => Validation::invalid(language, e.to_string()),
            },
        }
    }
}

fn in_folder(path: &str, source: &Source) -> bool {
    match source {
        Source::Folder(folder) if !folder.is_empty() => {
            path.strip_prefix(folder.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
        }
        _ => true,
    }
}

fn has_tag(fields: &Map<String, Value>, tag: &str) -> bool {
    let matches = |candidate: &str| candidate.trim_start_matches('#') == tag;
    match fields.get("tags").or_else(|| fields.get("tag")) {
        Some(Value::String(s)) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .any(matches),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

fn file_object(path: &str) -> Value {
    let (folder, file_name) = path.rsplit_once('/').unwrap_or(("", path));
    let name = file_name.strip_suffix(".md").unwrap_or(file_name);
    json!({"name": name, "path": path, "folder": folder})
}

/// Resolve a dot-separated field path.
fn lookup<'a>(fields: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(fields, |value, key| value.as_object()?.get(key))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn matches_condition(fields: &Value, condition: &Condition) -> bool {
    let actual = lookup(fields, &condition.field);
    let Some((op, expected)) = &condition.comparison else {
        return is_truthy(actual);
    };
    let Some(actual) = actual else {
        return *op == CompareOp::Ne;
    };

    let ordering = compare_values(actual, expected);
    match op {
        CompareOp::Eq => ordering == Some(Ordering::Equal),
        CompareOp::Ne => ordering != Some(Ordering::Equal),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    }
}

/// Compare two values of compatible kinds; `None` when they are not comparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Array(items), other) if !other.is_array() => items
            .iter()
            .any(|item| compare_values(item, other) == Some(Ordering::Equal))
            .then_some(Ordering::Equal),
        _ => (a == b).then_some(Ordering::Equal),
    }
}

/// Sort order: missing values last, then by natural value order.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| x.to_string().cmp(&y.to_string())),
    }
}

fn task_regex() -> &'static Regex {
    static TASK: OnceLock<Regex> = OnceLock::new();
    TASK.get_or_init(|| {
        Regex::new(r"^\s*[-*+] \[([ xX])\] (.*?)\s*$").expect("valid task pattern")
    })
}

fn collect_tasks(path: &str, text: &str) -> Vec<Value> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let caps = task_regex().captures(line)?;
            let completed = caps.get(1).is_some_and(|m| m.as_str() != " ");
            let text = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            Some(json!({
                "path": path,
                "line": index + 1,
                "text": text,
                "completed": completed,
            }))
        })
        .collect()
}
