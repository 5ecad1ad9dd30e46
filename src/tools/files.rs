//! Parameters for the file tools: listing, reading, appending, deleting.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListFilesInVaultParams {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListFilesInDirParams {
    #[schemars(description = "Path of the directory to list, relative to the vault root")]
    pub dirpath: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetFileContentsParams {
    #[schemars(description = "Path of the file, relative to the vault root")]
    pub filepath: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AppendContentParams {
    #[schemars(description = "Path of the file to append to. Created if it does not exist.")]
    pub filepath: String,

    #[schemars(description = "Text to append to the end of the file")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteFileParams {
    #[schemars(description = "Path of the file to delete")]
    pub filepath: String,

    #[schemars(description = "Must be true to actually delete the file")]
    #[serde(default)]
    pub confirm: bool,
}
