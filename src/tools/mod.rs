//! Note tools exposed over RPC.
//!
//! [`Tool`] is the registry: name, description, and JSON Schema of every tool.
//! [`NoteTools`] holds the shared state (document store, optional query engine,
//! patch options) and runs a tool against JSON arguments.

pub mod dataview;
pub mod files;
pub mod patch_content;
pub mod simple_search;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::dataview::render::render_document;
use crate::dataview::{QueryEngine, QueryLanguage, Validation};
use crate::error::ToolError;
use crate::note::patch::{self, PatchOptions, PatchRequest};
use crate::note::search::{self, DEFAULT_CONTEXT_LENGTH};
use crate::vault::{normalize_path, parent_folder, DocumentStore, Entry, VaultError};

use dataview::{DataviewQueryParams, GetRenderedContentParams, ValidateDataviewQueryParams};
use files::{
    AppendContentParams, DeleteFileParams, GetFileContentsParams, ListFilesInDirParams,
    ListFilesInVaultParams,
};
use patch_content::PatchContentParams;
use simple_search::SimpleSearchParams;

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ListFilesInVault,
    ListFilesInDir,
    GetFileContents,
    AppendContent,
    PatchContent,
    SimpleSearch,
    DeleteFile,
    DataviewQuery,
    ValidateDataviewQuery,
    GetRenderedContent,
}

impl Tool {
    pub const ALL: [Tool; 10] = [
        Self::ListFilesInVault,
        Self::ListFilesInDir,
        Self::GetFileContents,
        Self::AppendContent,
        Self::PatchContent,
        Self::SimpleSearch,
        Self::DeleteFile,
        Self::DataviewQuery,
        Self::ValidateDataviewQuery,
        Self::GetRenderedContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListFilesInVault => "list_files_in_vault",
            Self::ListFilesInDir => "list_files_in_dir",
            Self::GetFileContents => "get_file_contents",
            Self::AppendContent => "append_content",
            Self::PatchContent => "patch_content",
            Self::SimpleSearch => "simple_search",
            Self::DeleteFile => "delete_file",
            Self::DataviewQuery => "dataview_query",
            Self::ValidateDataviewQuery => "validate_dataview_query",
            Self::GetRenderedContent => "get_rendered_content",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ListFilesInVault => "List every file in the vault.",
            Self::ListFilesInDir => "List every file under a directory of the vault.",
            Self::GetFileContents => "Return the raw contents of a single file.",
            Self::AppendContent => {
                "Append content to a file, creating the file (and its folder) if it does not exist."
            }
            Self::PatchContent => {
                "Insert, prepend, or replace content under a heading, at a ^block reference, or in a frontmatter key, leaving the rest of the file untouched."
            }
            Self::SimpleSearch => {
                "Case-insensitive text search across all files. Returns each match with surrounding context."
            }
            Self::DeleteFile => "Delete a file. Requires confirm=true.",
            Self::DataviewQuery => "Run a Dataview (DQL) query: LIST, TABLE, or TASK over note metadata.",
            Self::ValidateDataviewQuery => "Check a Dataview query for errors without running it.",
            Self::GetRenderedContent => {
                "Return a file with its ```dataview blocks replaced by their rendered results."
            }
        }
    }

    /// JSON Schema of the tool's arguments.
    pub fn input_schema(&self) -> Value {
        match self {
            Self::ListFilesInVault => schema::<ListFilesInVaultParams>(),
            Self::ListFilesInDir => schema::<ListFilesInDirParams>(),
            Self::GetFileContents => schema::<GetFileContentsParams>(),
            Self::AppendContent => schema::<AppendContentParams>(),
            Self::PatchContent => schema::<PatchContentParams>(),
            Self::SimpleSearch => schema::<SimpleSearchParams>(),
            Self::DeleteFile => schema::<DeleteFileParams>(),
            Self::DataviewQuery => schema::<DataviewQueryParams>(),
            Self::ValidateDataviewQuery => schema::<ValidateDataviewQueryParams>(),
            Self::GetRenderedContent => schema::<GetRenderedContentParams>(),
        }
    }

    /// Entry for a `tools/list` response.
    pub fn definition(&self) -> Value {
        json!({
            "name": self.as_str(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tool {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

fn schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.entry("properties").or_insert_with(|| json!({}));
    }
    value
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// The tool handler. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct NoteTools {
    store: Arc<dyn DocumentStore>,
    query_engine: Option<Arc<dyn QueryEngine>>,
    patch_options: PatchOptions,
}

impl NoteTools {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        query_engine: Option<Arc<dyn QueryEngine>>,
        patch_options: PatchOptions,
    ) -> Self {
        Self {
            store,
            query_engine,
            patch_options,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Run `tool` with raw JSON arguments and return its typed result.
    pub fn call(&self, tool: Tool, arguments: Value) -> Result<Value, ToolError> {
        match tool {
            Tool::ListFilesInVault => {
                let ListFilesInVaultParams {} = parse_args(arguments)?;
                self.list_files_in_vault()
            }
            Tool::ListFilesInDir => self.list_files_in_dir(parse_args(arguments)?),
            Tool::GetFileContents => self.get_file_contents(parse_args(arguments)?),
            Tool::AppendContent => self.append_content(parse_args(arguments)?),
            Tool::PatchContent => self.patch_content(parse_args(arguments)?),
            Tool::SimpleSearch => self.simple_search(parse_args(arguments)?),
            Tool::DeleteFile => self.delete_file(parse_args(arguments)?),
            Tool::DataviewQuery => self.dataview_query(parse_args(arguments)?),
            Tool::ValidateDataviewQuery => self.validate_dataview_query(parse_args(arguments)?),
            Tool::GetRenderedContent => self.get_rendered_content(parse_args(arguments)?),
        }
    }

    fn list_files_in_vault(&self) -> Result<Value, ToolError> {
        let files = self.store.list()?;
        tracing::debug!(count = files.len(), "list_files_in_vault");
        Ok(json!(files))
    }

    fn list_files_in_dir(&self, params: ListFilesInDirParams) -> Result<Value, ToolError> {
        let dirpath = normalize_path(&params.dirpath)?;
        match self.store.lookup(&dirpath)? {
            Some(Entry::Directory) => {}
            Some(Entry::File) => return Err(VaultError::NotDirectory(dirpath).into()),
            None => return Err(VaultError::NotFound(dirpath).into()),
        }
        let files = self.store.list_under(&dirpath)?;
        tracing::debug!(dirpath = %dirpath, count = files.len(), "list_files_in_dir");
        Ok(json!(files))
    }

    fn get_file_contents(&self, params: GetFileContentsParams) -> Result<Value, ToolError> {
        let filepath = normalize_path(&params.filepath)?;
        let text = self.store.read_file(&filepath)?;
        tracing::debug!(path = %filepath, bytes = text.len(), "get_file_contents");
        Ok(Value::String(text))
    }

    fn append_content(&self, params: AppendContentParams) -> Result<Value, ToolError> {
        let filepath = normalize_path(&params.filepath)?;
        let created = match self.store.lookup(&filepath)? {
            Some(Entry::File) => {
                let existing = self.store.read(&filepath)?;
                let separator = if existing.is_empty() || existing.ends_with('\n') {
                    ""
                } else {
                    "\n"
                };
                self.store
                    .modify(&filepath, &format!("{existing}{separator}{}", params.content))?;
                false
            }
            Some(Entry::Directory) => return Err(VaultError::IsDirectory(filepath).into()),
            None => {
                if let Some(parent) = parent_folder(&filepath) {
                    self.store.ensure_folder(parent)?;
                }
                self.store.create(&filepath, &params.content)?;
                true
            }
        };

        tracing::info!(path = %filepath, created, bytes = params.content.len(), "content appended");
        Ok(json!({"success": true, "path": filepath, "created": created}))
    }

    fn patch_content(&self, params: PatchContentParams) -> Result<Value, ToolError> {
        let filepath = normalize_path(&params.filepath)?;
        let request = PatchRequest {
            operation: params.operation.parse()?,
            target_type: params.target_type.parse()?,
            target: params.target,
            content: params.content,
        };
        patch::patch_document(self.store.as_ref(), &filepath, &request, self.patch_options)?;
        Ok(json!({
            "success": true,
            "path": filepath,
            "operation": request.operation.as_str(),
            "target_type": request.target_type.as_str(),
            "target": request.target,
        }))
    }

    fn simple_search(&self, params: SimpleSearchParams) -> Result<Value, ToolError> {
        let context_length = params.context_length.unwrap_or(DEFAULT_CONTEXT_LENGTH);
        let results = search::search_vault(self.store.as_ref(), &params.query, context_length)?;
        Ok(serde_json::to_value(results)?)
    }

    fn delete_file(&self, params: DeleteFileParams) -> Result<Value, ToolError> {
        let filepath = normalize_path(&params.filepath)?;
        if !params.confirm {
            return Err(ToolError::ConfirmationRequired(filepath));
        }
        match self.store.lookup(&filepath)? {
            Some(Entry::File) => {}
            Some(Entry::Directory) => return Err(VaultError::IsDirectory(filepath).into()),
            None => return Err(VaultError::NotFound(filepath).into()),
        }

        self.store.delete(&filepath)?;
        tracing::info!(path = %filepath, "file deleted");
        Ok(json!({"success": true, "path": filepath, "deleted": true}))
    }

    fn dataview_query(&self, params: DataviewQueryParams) -> Result<Value, ToolError> {
        let engine = self
            .query_engine
            .as_ref()
            .ok_or(ToolError::DataviewDisabled)?;
        Ok(engine.query(&params.query)?)
    }

    fn validate_dataview_query(
        &self,
        params: ValidateDataviewQueryParams,
    ) -> Result<Value, ToolError> {
        let language: QueryLanguage = params
            .r#type
            .as_deref()
            .unwrap_or("dql")
            .parse()
            .map_err(ToolError::InvalidArguments)?;

        let validation = match &self.query_engine {
            Some(engine) => engine.validate(&params.query, language),
            None => Validation::invalid(language, ToolError::DataviewDisabled.to_string()),
        };
        Ok(serde_json::to_value(validation)?)
    }

    fn get_rendered_content(&self, params: GetRenderedContentParams) -> Result<Value, ToolError> {
        let filepath = normalize_path(&params.filepath)?;
        let text = self.store.read_file(&filepath)?;
        let rendered = match &self.query_engine {
            Some(engine) => render_document(&text, engine.as_ref()),
            None => text,
        };
        Ok(Value::String(rendered))
    }
}
