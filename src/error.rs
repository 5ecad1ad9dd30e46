//! Domain errors surfaced to RPC callers.
//!
//! Every [`ToolError`] becomes a JSON-RPC `-32603` error whose message is the
//! `Display` text, so variants are worded for the caller.

use thiserror::Error;

use crate::dataview::QueryError;
use crate::note::patch::PatchError;
use crate::vault::VaultError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Deletion not confirmed: pass confirm=true to delete {0}")]
    ConfirmationRequired(String),

    #[error("Dataview plugin is not enabled")]
    DataviewDisabled,

    #[error("Dataview query failed: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {e}"))
    }
}
