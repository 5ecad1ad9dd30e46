mod helpers;

use std::sync::Arc;

use helpers::tools_for;
use noteport::error::ToolError;
use noteport::tools::Tool;
use noteport::vault::fs::FsVault;
use noteport::vault::{DocumentStore, VaultError};
use serde_json::json;

fn open_vault() -> (tempfile::TempDir, Arc<FsVault>) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("notes")).unwrap();
    std::fs::create_dir_all(dir.path().join(".obsidian")).unwrap();
    std::fs::write(dir.path().join(".obsidian/app.json"), "{}").unwrap();
    std::fs::write(
        dir.path().join("notes/plan.md"),
        "---\nowner: ann\n---\n# Plan\n\n## Todo\n- write tests\n\n## Done\n- nothing yet ^done-list\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("plain.md"), "no metadata here\n").unwrap();
    let vault = FsVault::open(dir.path(), Some("disk".into())).unwrap();
    (dir, Arc::new(vault))
}

#[test]
fn listing_skips_hidden_entries() {
    let (_dir, vault) = open_vault();
    let tools = tools_for(vault);

    let all = tools.call(Tool::ListFilesInVault, json!({})).unwrap();
    assert_eq!(all, json!(["notes/plan.md", "plain.md"]));

    let under = tools
        .call(Tool::ListFilesInDir, json!({"dirpath": "notes/"}))
        .unwrap();
    assert_eq!(under, json!(["notes/plan.md"]));
}

#[test]
fn heading_and_block_patches_hit_the_disk() {
    let (dir, vault) = open_vault();
    let tools = tools_for(vault);

    tools
        .call(
            Tool::PatchContent,
            json!({"filepath": "notes/plan.md", "operation": "append", "target_type": "heading", "target": "Todo", "content": "- ship it\n\n"}),
        )
        .unwrap();
    tools
        .call(
            Tool::PatchContent,
            json!({"filepath": "notes/plan.md", "operation": "replace", "target_type": "block", "target": "done-list", "content": "- tests written"}),
        )
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("notes/plan.md")).unwrap();
    assert_eq!(
        text,
        "---\nowner: ann\n---\n# Plan\n\n## Todo\n- write tests\n\n- ship it\n\n## Done\n- tests written ^done-list\n"
    );
}

#[test]
fn frontmatter_patch_adds_block_to_plain_note() {
    let (dir, vault) = open_vault();
    let tools = tools_for(vault);

    // A string leaf concatenates on append, so seed the list as an array.
    for tag in [r#"["a"]"#, "b", "c"] {
        tools
            .call(
                Tool::PatchContent,
                json!({"filepath": "plain.md", "operation": "append", "target_type": "frontmatter", "target": "tags", "content": tag}),
            )
            .unwrap();
    }
    tools
        .call(
            Tool::PatchContent,
            json!({"filepath": "plain.md", "operation": "replace", "target_type": "frontmatter", "target": "meta.rating", "content": "4"}),
        )
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("plain.md")).unwrap();
    let split = noteport::vault::frontmatter::split(&text);
    assert_eq!(split.body, "no metadata here\n");
    let mapping = noteport::vault::frontmatter::parse(split.yaml).unwrap();
    assert_eq!(mapping["tags"], json!(["a", "b", "c"]));
    assert_eq!(mapping["meta"], json!({"rating": 4}));
}

#[test]
fn append_creates_nested_file_and_delete_removes_it() {
    let (dir, vault) = open_vault();
    let tools = tools_for(vault.clone());

    let created = tools
        .call(
            Tool::AppendContent,
            json!({"filepath": "journal/2024/jan.md", "content": "day one"}),
        )
        .unwrap();
    assert_eq!(created["success"], json!(true));
    assert!(dir.path().join("journal/2024/jan.md").is_file());

    let err = tools
        .call(Tool::DeleteFile, json!({"filepath": "journal", "confirm": true}))
        .unwrap_err();
    assert!(matches!(err, ToolError::Vault(VaultError::IsDirectory(_))));

    tools
        .call(
            Tool::DeleteFile,
            json!({"filepath": "journal/2024/jan.md", "confirm": true}),
        )
        .unwrap();
    assert!(!dir.path().join("journal/2024/jan.md").exists());
    assert!(vault.lookup("journal/2024/jan.md").unwrap().is_none());
}

#[test]
fn traversal_outside_the_vault_is_rejected() {
    let (_dir, vault) = open_vault();
    let tools = tools_for(vault);

    let err = tools
        .call(Tool::GetFileContents, json!({"filepath": "../secret.md"}))
        .unwrap_err();
    assert!(matches!(err, ToolError::Vault(VaultError::InvalidPath(_))));
}

#[test]
fn search_and_dataview_over_disk() {
    let (_dir, vault) = open_vault();
    let tools = tools_for(vault);

    let results = tools
        .call(Tool::SimpleSearch, json!({"query": "TESTS", "context_length": 6}))
        .unwrap();
    assert_eq!(
        results,
        json!([{"file": "notes/plan.md", "match": "write tests\n\n## D", "position": 43}])
    );

    let table = tools
        .call(Tool::DataviewQuery, json!({"query": "TABLE owner WHERE owner = \"ann\""}))
        .unwrap();
    assert_eq!(table["values"], json!([["notes/plan.md", "ann"]]));
}
