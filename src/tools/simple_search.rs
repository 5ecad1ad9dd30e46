use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SimpleSearchParams {
    #[schemars(description = "Text to search for (case-insensitive)")]
    pub query: String,

    #[schemars(description = "Characters of context to return around each match. Defaults to 100.")]
    pub context_length: Option<usize>,
}
