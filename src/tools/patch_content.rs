use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PatchContentParams {
    #[schemars(description = "Path of the file to patch")]
    pub filepath: String,

    #[schemars(description = "How to combine content with the target: 'append', 'prepend', or 'replace'")]
    pub operation: String,

    #[schemars(
        description = "What to target: 'heading' (a section under a heading), 'block' (a line tagged ^block-id), or 'frontmatter' (a YAML key)"
    )]
    pub target_type: String,

    #[schemars(
        description = "Heading text, block id (without ^), or dot-separated frontmatter key path (e.g. 'meta.author')"
    )]
    pub target: String,

    #[schemars(
        description = "Content to insert. For frontmatter, JSON literals (numbers, booleans, arrays, objects) are parsed; anything else is stored as a string."
    )]
    pub content: String,
}
