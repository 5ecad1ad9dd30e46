mod helpers;

use helpers::sample_vault;
use noteport::note::patch::{
    locate_heading, patch_document, patch_heading, PatchError, PatchOperation, PatchOptions,
    PatchRequest, TargetType,
};
use noteport::vault::DocumentStore;

const DOCUMENTS: &[&str] = &[
    "# A\nalpha\n## B\nbeta\n### C\ngamma\n",
    "---\ntitle: x\n---\n# A\n\n## B\n\nbody b\n\n## D\nlast",
    "intro without heading\n# A\n# B\n# C",
    "# A\r\nwindows\r\n## B\r\nlines\r\n",
];

fn replace(text: &str, heading: &str, content: &str) -> String {
    patch_heading(
        text,
        PatchOperation::Replace,
        heading,
        content,
        PatchOptions::default(),
    )
    .unwrap()
}

#[test]
fn replace_then_relocate_yields_new_body_and_leaves_the_rest() {
    for doc in DOCUMENTS {
        for heading in ["A", "B"] {
            let before = locate_heading(doc, heading, PatchOptions::default()).unwrap();
            let content = "NEW CONTENT\n";
            let patched = replace(doc, heading, content);

            let after = locate_heading(&patched, heading, PatchOptions::default()).unwrap();
            assert_eq!(&patched[after.body.clone()], content, "doc {doc:?}");
            let separator = if before.heading_unterminated { "\n" } else { "" };
            let expected_prefix = format!("{}{separator}", &doc[..before.body.start]);
            assert_eq!(&patched[..after.body.start], expected_prefix);
            assert_eq!(&patched[after.body.end..], &doc[before.body.end..]);
        }
    }
}

#[test]
fn append_is_replace_with_concatenation() {
    for doc in DOCUMENTS {
        for heading in ["A", "B"] {
            let original = locate_heading(doc, heading, PatchOptions::default()).unwrap();
            let original_body = &doc[original.body.clone()];
            let addition = "appended line\n";

            let appended = patch_heading(
                doc,
                PatchOperation::Append,
                heading,
                addition,
                PatchOptions::default(),
            )
            .unwrap();
            let replaced = replace(doc, heading, &format!("{original_body}{addition}"));
            assert_eq!(appended, replaced, "doc {doc:?}");
        }
    }
}

#[test]
fn missing_targets_fail_and_leave_the_document_unchanged() {
    let vault = sample_vault();
    let path = "projects/alpha.md";
    let before = vault.read(path).unwrap();

    let missing_heading = PatchRequest {
        operation: PatchOperation::Append,
        target_type: TargetType::Heading,
        target: "Nonexistent".into(),
        content: "x".into(),
    };
    let err = patch_document(&*vault, path, &missing_heading, PatchOptions::default())
        .unwrap_err();
    assert!(matches!(err, PatchError::HeadingNotFound(_)));

    let missing_block = PatchRequest {
        target_type: TargetType::Block,
        target: "nope".into(),
        ..missing_heading
    };
    let err = patch_document(&*vault, path, &missing_block, PatchOptions::default())
        .unwrap_err();
    assert!(matches!(err, PatchError::BlockNotFound(_)));

    assert_eq!(vault.read(path).unwrap(), before);
}

#[test]
fn frontmatter_patch_keeps_body_byte_identical() {
    let vault = sample_vault();
    let path = "projects/alpha.md";
    let body_before = noteport::vault::frontmatter::split(&vault.read(path).unwrap())
        .body
        .to_string();

    for (operation, target, content) in [
        (PatchOperation::Append, "tags", "rust"),
        (PatchOperation::Replace, "status", "done"),
        (PatchOperation::Replace, "review.score", "9"),
    ] {
        let request = PatchRequest {
            operation,
            target_type: TargetType::Frontmatter,
            target: target.into(),
            content: content.into(),
        };
        patch_document(&*vault, path, &request, PatchOptions::default()).unwrap();
    }

    let text = vault.read(path).unwrap();
    let split = noteport::vault::frontmatter::split(&text);
    assert_eq!(split.body, body_before);

    let mapping = noteport::vault::frontmatter::parse(split.yaml).unwrap();
    assert_eq!(mapping["tags"], serde_json::json!(["project", "rust"]));
    assert_eq!(mapping["status"], serde_json::json!("done"));
    assert_eq!(mapping["review"]["score"], serde_json::json!(9));
}

#[test]
fn block_patch_touches_only_its_line() {
    let vault = sample_vault();
    let path = "projects/alpha.md";
    let before = vault.read(path).unwrap();

    let request = PatchRequest {
        operation: PatchOperation::Prepend,
        target_type: TargetType::Block,
        target: "note1".into(),
        content: "Update: ".into(),
    };
    patch_document(&*vault, path, &request, PatchOptions::default()).unwrap();

    let after = vault.read(path).unwrap();
    assert_eq!(
        after,
        before.replace("A quiet cat ^note1", "Update: A quiet cat ^note1")
    );
}

#[test]
fn frontmatter_patch_leaves_other_keys_in_place() {
    let vault = noteport::vault::memory::MemoryVault::with_documents(
        "order",
        [(
            "note.md",
            "---\ntitle: T\nstatus: x\nscore: .nan\nauthor: ann\n---\nbody\n",
        )],
    )
    .unwrap();

    let request = PatchRequest {
        operation: PatchOperation::Replace,
        target_type: TargetType::Frontmatter,
        target: "status".into(),
        content: "done".into(),
    };
    patch_document(&vault, "note.md", &request, PatchOptions::default()).unwrap();

    assert_eq!(
        vault.read("note.md").unwrap(),
        "---\ntitle: T\nstatus: done\nscore: .nan\nauthor: ann\n---\nbody\n"
    );
}
