//! Inline rendering of fenced `dataview` blocks.

use serde_json::Value;

use super::QueryEngine;

const FENCE: &str = "```";
const DATAVIEW_LANG: &str = "dataview";

/// Replace every ```` ```dataview ```` block in `text` with rendered markdown.
///
/// Blocks in other languages (including `dataviewjs`) are left untouched, as is
/// an unterminated block.
pub fn render_document(text: &str, engine: &dyn QueryEngine) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.split_inclusive('\n');

    while let Some(line) = lines.next() {
        if !is_dataview_open(line) {
            out.push_str(line);
            continue;
        }

        let mut block = vec![line];
        let mut source = String::new();
        let mut closed = false;
        for inner in lines.by_ref() {
            block.push(inner);
            if inner.trim() == FENCE {
                closed = true;
                break;
            }
            source.push_str(inner);
        }

        if !closed {
            block.iter().for_each(|l| out.push_str(l));
            continue;
        }

        let rendered = match engine.query(source.trim()) {
            Ok(value) => render_value(&value),
            Err(e) => format!("> [!error] Dataview query failed\n> {e}\n"),
        };
        if line_ends_with_newline(&block) {
            out.push_str(&rendered);
        } else {
            out.push_str(rendered.strip_suffix('\n').unwrap_or(&rendered));
        }
    }

    out
}

fn is_dataview_open(line: &str) -> bool {
    line.trim()
        .strip_prefix(FENCE)
        .is_some_and(|lang| lang.trim() == DATAVIEW_LANG)
}

fn line_ends_with_newline(block: &[&str]) -> bool {
    block.last().is_some_and(|l| l.ends_with('\n'))
}

/// Render a query result as markdown.
pub fn render_value(value: &Value) -> String {
    let values = value.get("values").and_then(Value::as_array);
    match (value.get("type").and_then(Value::as_str), values) {
        (Some("list"), Some(items)) => items
            .iter()
            .map(|item| format!("- {}\n", link(&cell(item))))
            .collect(),
        (Some("table"), Some(rows)) => {
            let headers: Vec<String> = value
                .get("headers")
                .and_then(Value::as_array)
                .map(|h| h.iter().map(cell).collect())
                .unwrap_or_default();
            let mut out = format!("| {} |\n", headers.join(" | "));
            out.push_str(&format!("|{}\n", " --- |".repeat(headers.len().max(1))));
            for row in rows {
                let cells: Vec<String> = row
                    .as_array()
                    .map(|r| {
                        r.iter()
                            .enumerate()
                            .map(|(i, v)| if i == 0 { link(&cell(v)) } else { cell(v) })
                            .collect()
                    })
                    .unwrap_or_default();
                out.push_str(&format!("| {} |\n", cells.join(" | ")));
            }
            out
        }
        (Some("task"), Some(tasks)) => tasks
            .iter()
            .map(|task| {
                let done = task.get("completed").and_then(Value::as_bool).unwrap_or(false);
                let text = task.get("text").map(cell).unwrap_or_default();
                format!("- [{}] {}\n", if done { "x" } else { " " }, text)
            })
            .collect(),
        _ => format!("```json\n{value:#}\n```\n"),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.replace('|', "\\|"),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn link(path: &str) -> String {
    format!("[[{}]]", path.strip_suffix(".md").unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataview::{QueryError, QueryLanguage, Validation};
    use serde_json::json;

    struct Fixed(Result<Value, String>);

    impl QueryEngine for Fixed {
        fn query(&self, _source: &str) -> Result<Value, QueryError> {
            self.0.clone().map_err(QueryError::Parse)
        }

        fn validate(&self, _source: &str, language: QueryLanguage) -> Validation {
            Validation::ok(language)
        }
    }

    #[test]
    fn replaces_dataview_block_with_list() {
        let engine = Fixed(Ok(json!({"type": "list", "values": ["a/b.md", "c.md"]})));
        let doc = "# Index\n```dataview\nLIST\n```\nafter\n";
        assert_eq!(
            render_document(doc, &engine),
            "# Index\n- [[a/b]]\n- [[c]]\nafter\n"
        );
    }

    #[test]
    fn renders_table_and_tasks() {
        let table = json!({
            "type": "table",
            "headers": ["File", "rating"],
            "values": [["x.md", 5], ["y.md", null]],
        });
        assert_eq!(
            render_value(&table),
            "| File | rating |\n| --- | --- |\n| [[x]] | 5 |\n| [[y]] |  |\n"
        );

        let tasks = json!({
            "type": "task",
            "values": [{"text": "a", "completed": true}, {"text": "b", "completed": false}],
        });
        assert_eq!(render_value(&tasks), "- [x] a\n- [ ] b\n");
    }

    #[test]
    fn errors_render_as_callout() {
        let engine = Fixed(Err("bad query".into()));
        let doc = "```dataview\nLIST FROM\n```\n";
        assert_eq!(
            render_document(doc, &engine),
            "> [!error] Dataview query failed\n> bad query\n"
        );
    }

    #[test]
    fn leaves_other_blocks_alone() {
        let engine = Fixed(Ok(json!({"type": "list", "values": []})));
        let doc = "```dataviewjs\ndv.pages()\n```\n```rust\nfn x() {}\n```\n```dataview\nLIST";
        assert_eq!(render_document(doc, &engine), doc);
    }

    #[test]
    fn block_at_end_without_newline() {
        let engine = Fixed(Ok(json!({"type": "list", "values": ["n.md"]})));
        assert_eq!(render_document("x\n```dataview\nLIST\n```", &engine), "x\n- [[n]]");
    }
}
