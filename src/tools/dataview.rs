//! Parameters for the structured-query tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DataviewQueryParams {
    #[schemars(description = "DQL query, e.g. 'TABLE status FROM \"projects\" WHERE priority > 1'")]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ValidateDataviewQueryParams {
    #[schemars(description = "Query to validate without running it")]
    pub query: String,

    #[schemars(description = "Query language: 'dql' (default) or 'js'")]
    pub r#type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetRenderedContentParams {
    #[schemars(description = "Path of the file to render with its dataview blocks expanded")]
    pub filepath: String,
}
