//! Method registry.
//!
//! A method is either protocol plumbing (`initialize`, `ping`, `tools/list`,
//! `tools/call`) or a tool name called directly. `tools/call` runs the same
//! tool but wraps its result in a text content envelope.

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tools::{NoteTools, Tool};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct Dispatcher {
    tools: NoteTools,
    server_name: String,
    server_version: String,
}

impl Dispatcher {
    pub fn new(tools: NoteTools) -> Self {
        Self {
            tools,
            server_name: env!("CARGO_PKG_NAME").to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn vault_name(&self) -> &str {
        self.tools.store().name()
    }

    /// Run `method` with `params`. Synchronous; call from a blocking task.
    pub fn execute(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        match method {
            "initialize" => Ok(self.initialize()),
            "ping" | "notifications/initialized" => Ok(json!({})),
            "tools/list" => Ok(tools_list()),
            "tools/call" => self.tools_call(params),
            other => {
                let tool: Tool = other
                    .parse()
                    .map_err(|_| ToolError::UnknownMethod(other.to_string()))?;
                self.tools.call(tool, params)
            }
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": false}
            },
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version,
            },
        })
    }

    fn tools_call(&self, params: Value) -> Result<Value, ToolError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("tools/call requires a tool name".into()))?;
        let tool: Tool = name.parse()?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        tracing::debug!(tool = %tool, "tools/call");
        let result = self.tools.call(tool, arguments)?;
        let text = match result {
            Value::String(text) => text,
            other => serde_json::to_string_pretty(&other)?,
        };
        Ok(json!({"content": [{"type": "text", "text": text}]}))
    }
}

fn tools_list() -> Value {
    let tools: Vec<Value> = Tool::ALL.iter().map(Tool::definition).collect();
    json!({"tools": tools})
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::note::patch::PatchOptions;
    use crate::vault::memory::MemoryVault;
    use crate::vault::DocumentStore;

    fn dispatcher() -> Dispatcher {
        let store: Arc<dyn DocumentStore> = Arc::new(
            MemoryVault::with_documents("vault", [("X.md", "# Title\nhello\n"), ("a/b.md", "b")])
                .unwrap(),
        );
        Dispatcher::new(NoteTools::new(store, None, PatchOptions::default()))
    }

    #[test]
    fn initialize_reports_protocol_and_server() {
        let result = dispatcher().execute("initialize", Value::Null).unwrap();
        assert_eq!(result["protocolVersion"], json!(PROTOCOL_VERSION));
        assert_eq!(result["capabilities"]["tools"]["listChanged"], json!(false));
        assert_eq!(result["serverInfo"]["name"], json!("noteport"));
    }

    #[test]
    fn tools_list_covers_every_tool() {
        let result = dispatcher().execute("tools/list", Value::Null).unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names.len(), Tool::ALL.len());
        assert!(names.contains(&"patch_content"));
        assert!(result["tools"][0]["inputSchema"].is_object());
    }

    #[test]
    fn tools_call_and_direct_call_agree() {
        let d = dispatcher();
        let direct = d
            .execute("get_file_contents", json!({"filepath": "X.md"}))
            .unwrap();
        let wrapped = d
            .execute(
                "tools/call",
                json!({"name": "get_file_contents", "arguments": {"filepath": "X.md"}}),
            )
            .unwrap();
        assert_eq!(direct, json!("# Title\nhello\n"));
        assert_eq!(
            wrapped,
            json!({"content": [{"type": "text", "text": "# Title\nhello\n"}]})
        );
    }

    #[test]
    fn tools_call_pretty_prints_structured_results() {
        let wrapped = dispatcher()
            .execute("tools/call", json!({"name": "list_files_in_vault"}))
            .unwrap();
        let text = wrapped["content"][0]["text"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!(["X.md", "a/b.md"])
        );
        assert!(text.contains('\n'));
    }

    #[test]
    fn unknown_names_are_domain_errors() {
        let d = dispatcher();
        let err = d.execute("nope", Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Unknown method: nope");

        let err = d
            .execute("tools/call", json!({"name": "nope"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: nope");

        let err = d.execute("tools/call", json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn ping_and_initialized_notification() {
        let d = dispatcher();
        assert_eq!(d.execute("ping", Value::Null).unwrap(), json!({}));
        assert_eq!(
            d.execute("notifications/initialized", Value::Null).unwrap(),
            json!({})
        );
    }
}
