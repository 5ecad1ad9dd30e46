//! Case-insensitive substring search across every note.
//!
//! Offsets and context windows are measured in characters, so a window never
//! splits a multi-byte character.

use serde::Serialize;

use crate::vault::{DocumentStore, VaultError};

/// Default number of characters of context on each side of a match.
pub const DEFAULT_CONTEXT_LENGTH: usize = 100;

/// One occurrence of the query inside a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    /// Vault path of the note.
    pub file: String,
    /// The match plus up to `context_length` characters on each side, original case.
    #[serde(rename = "match")]
    pub context: String,
    /// Character offset of the match within the note.
    pub position: usize,
}

/// Search every readable document in the store.
///
/// Documents that are not UTF-8 text are skipped. Results come back ordered
/// by path, then position.
pub fn search_vault(
    store: &dyn DocumentStore,
    query: &str,
    context_length: usize,
) -> Result<Vec<SearchMatch>, VaultError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for path in store.list()? {
        let text = match store.read(&path) {
            Ok(text) => text,
            Err(VaultError::NotText(_)) => {
                tracing::debug!(path = %path, "skipping non-text document");
                continue;
            }
            Err(e) => return Err(e),
        };
        results.extend(search_text(&path, &text, query, context_length));
    }

    tracing::debug!(query = %query, matches = results.len(), "search complete");
    Ok(results)
}

/// Find every non-overlapping, case-insensitive occurrence of `query` in `text`.
pub fn search_text(
    file: &str,
    text: &str,
    query: &str,
    context_length: usize,
) -> Vec<SearchMatch> {
    let needle: Vec<char> = query.chars().map(fold).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let haystack: Vec<char> = text.chars().collect();
    let folded: Vec<char> = haystack.iter().copied().map(fold).collect();

    let mut matches = Vec::new();
    let mut position = 0;
    while position + needle.len() <= folded.len() {
        if folded[position..position + needle.len()] == needle[..] {
            let start = position.saturating_sub(context_length);
            let end = (position + needle.len() + context_length).min(haystack.len());
            matches.push(SearchMatch {
                file: file.to_string(),
                context: haystack[start..end].iter().collect(),
                position,
            });
            position += needle.len();
        } else {
            position += 1;
        }
    }
    matches
}

/// Single-character case fold. Characters whose lowercase form expands to
/// several characters fold to the first one, which keeps offsets aligned.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::memory::MemoryVault;

    #[test]
    fn finds_every_occurrence_case_insensitively() {
        let results = search_text("pets.md", "Cat cat scatter", "cat", 2);
        let positions: Vec<usize> = results.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![0, 4, 9]);

        let contexts: Vec<&str> = results.iter().map(|m| m.context.as_str()).collect();
        assert_eq!(contexts, vec!["Cat c", "t cat s", " scatte"]);
        assert!(results.iter().all(|m| m.file == "pets.md"));
    }

    #[test]
    fn context_is_clipped_at_document_edges() {
        let results = search_text("a.md", "needle", "NEEDLE", 100);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].context, "needle");
        assert_eq!(results[0].position, 0);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let results = search_text("u.md", "héllo wörld wörld", "WÖRLD", 1);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].position, 6);
        assert_eq!(results[0].context, " wörld ");
        assert_eq!(results[1].position, 12);
        assert_eq!(results[1].context, " wörld");
    }

    #[test]
    fn occurrences_do_not_overlap() {
        let results = search_text("o.md", "aaaa", "aa", 0);
        let positions: Vec<usize> = results.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(search_text("e.md", "anything", "", 10).is_empty());
        let vault = MemoryVault::with_documents("v", [("a.md", "text")]).unwrap();
        assert!(search_vault(&vault, "", 10).unwrap().is_empty());
    }

    #[test]
    fn vault_search_orders_by_path_then_position() {
        let vault = MemoryVault::with_documents(
            "v",
            [("b.md", "rust and Rust"), ("a.md", "I like rust"), ("c.md", "nothing")],
        )
        .unwrap();
        let results = search_vault(&vault, "rust", 0).unwrap();
        let keys: Vec<(&str, usize)> = results
            .iter()
            .map(|m| (m.file.as_str(), m.position))
            .collect();
        assert_eq!(keys, vec![("a.md", 7), ("b.md", 0), ("b.md", 9)]);
    }

    #[test]
    fn serializes_match_field_name() {
        let m = SearchMatch {
            file: "a.md".into(),
            context: "x".into(),
            position: 3,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json, serde_json::json!({"file": "a.md", "match": "x", "position": 3}));
    }
}
