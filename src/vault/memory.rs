//! In-process vault backed by a sorted map.
//!
//! Folders are implied by document path prefixes plus any folder explicitly
//! created with [`DocumentStore::ensure_folder`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use super::{normalize_path, parent_folder, DocumentStore, Entry, VaultError};

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<String, String>,
    folders: BTreeSet<String>,
}

/// A vault that lives entirely in memory.
#[derive(Debug)]
pub struct MemoryVault {
    name: String,
    inner: RwLock<Inner>,
}

impl MemoryVault {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Build a vault pre-populated with `(path, text)` documents.
    pub fn with_documents<'a>(
        name: impl Into<String>,
        documents: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, VaultError> {
        let vault = Self::new(name);
        for (path, text) in documents {
            vault.create(path, text)?;
        }
        Ok(vault)
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn is_folder(inner: &Inner, path: &str) -> bool {
    if path.is_empty() || inner.folders.contains(path) {
        return true;
    }
    let prefix = format!("{path}/");
    inner
        .documents
        .range(prefix.clone()..)
        .next()
        .is_some_and(|(p, _)| p.starts_with(&prefix))
}

fn document_path(path: &str) -> Result<String, VaultError> {
    let normalized = normalize_path(path)?;
    if normalized.is_empty() {
        return Err(VaultError::InvalidPath(path.to_string()));
    }
    Ok(normalized)
}

impl DocumentStore for MemoryVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<String>, VaultError> {
        Ok(self.read_inner().documents.keys().cloned().collect())
    }

    fn list_under(&self, prefix: &str) -> Result<Vec<String>, VaultError> {
        let normalized = normalize_path(prefix)?;
        let inner = self.read_inner();
        if inner.documents.contains_key(&normalized) {
            return Err(VaultError::NotDirectory(normalized));
        }
        if !is_folder(&inner, &normalized) {
            return Err(VaultError::NotFound(normalized));
        }
        if normalized.is_empty() {
            return Ok(inner.documents.keys().cloned().collect());
        }

        let dir = format!("{normalized}/");
        Ok(inner
            .documents
            .keys()
            .filter(|p| p.starts_with(&dir))
            .cloned()
            .collect())
    }

    fn lookup(&self, path: &str) -> Result<Option<Entry>, VaultError> {
        let normalized = normalize_path(path)?;
        let inner = self.read_inner();
        if inner.documents.contains_key(&normalized) {
            Ok(Some(Entry::File))
        } else if is_folder(&inner, &normalized) {
            Ok(Some(Entry::Directory))
        } else {
            Ok(None)
        }
    }

    fn read(&self, path: &str) -> Result<String, VaultError> {
        let normalized = document_path(path)?;
        self.read_inner()
            .documents
            .get(&normalized)
            .cloned()
            .ok_or(VaultError::NotFound(normalized))
    }

    fn create(&self, path: &str, text: &str) -> Result<(), VaultError> {
        let normalized = document_path(path)?;
        let mut inner = self.write_inner();
        if inner.documents.contains_key(&normalized) || is_folder(&inner, &normalized) {
            return Err(VaultError::AlreadyExists(normalized));
        }
        if let Some(parent) = parent_folder(&normalized) {
            inner.folders.insert(parent.to_string());
        }
        inner.documents.insert(normalized, text.to_string());
        Ok(())
    }

    fn modify(&self, path: &str, text: &str) -> Result<(), VaultError> {
        let normalized = document_path(path)?;
        let mut inner = self.write_inner();
        if !inner.documents.contains_key(&normalized) {
            return if is_folder(&inner, &normalized) {
                Err(VaultError::IsDirectory(normalized))
            } else {
                Err(VaultError::NotFound(normalized))
            };
        }
        inner.documents.insert(normalized, text.to_string());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), VaultError> {
        let normalized = document_path(path)?;
        let mut inner = self.write_inner();
        if inner.documents.remove(&normalized).is_some() {
            return Ok(());
        }
        if !is_folder(&inner, &normalized) {
            return Err(VaultError::NotFound(normalized));
        }

        let dir = format!("{normalized}/");
        inner.documents.retain(|p, _| !p.starts_with(&dir));
        inner
            .folders
            .retain(|f| f != &normalized && !f.starts_with(&dir));
        Ok(())
    }

    fn ensure_folder(&self, path: &str) -> Result<(), VaultError> {
        let normalized = normalize_path(path)?;
        let mut inner = self.write_inner();
        if inner.documents.contains_key(&normalized) {
            return Err(VaultError::NotDirectory(normalized));
        }
        if !normalized.is_empty() {
            inner.folders.insert(normalized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn folders_are_implied_by_documents() {
        let vault = MemoryVault::with_documents("mem", [("a/b/c.md", "x"), ("a/d.md", "y")]).unwrap();
        assert_eq!(vault.lookup("a").unwrap(), Some(Entry::Directory));
        assert_eq!(vault.lookup("a/b").unwrap(), Some(Entry::Directory));
        assert_eq!(vault.lookup("a/d.md").unwrap(), Some(Entry::File));
        assert_eq!(vault.lookup("a/zz").unwrap(), None);
        assert_eq!(vault.list_under("a/b").unwrap(), vec!["a/b/c.md"]);
        assert_eq!(vault.list_under("").unwrap().len(), 2);
    }

    #[test]
    fn sibling_prefix_is_not_a_folder() {
        let vault = MemoryVault::with_documents("mem", [("ab/c.md", "x")]).unwrap();
        assert_eq!(vault.lookup("a").unwrap(), None);
    }

    #[test]
    fn read_file_distinguishes_directory() {
        let vault = MemoryVault::with_documents("mem", [("a/c.md", "x")]).unwrap();
        assert!(matches!(vault.read_file("a"), Err(VaultError::IsDirectory(_))));
        assert!(matches!(vault.read_file("nope.md"), Err(VaultError::NotFound(_))));
        assert_eq!(vault.read_file("a/c.md").unwrap(), "x");
    }

    #[test]
    fn process_frontmatter_creates_block_and_keeps_body() {
        let vault = MemoryVault::with_documents("mem", [("n.md", "# Title\nbody\n")]).unwrap();
        vault
            .process_frontmatter("n.md", &mut |map| {
                map.insert("status".into(), json!("done"));
            })
            .unwrap();
        assert_eq!(vault.read("n.md").unwrap(), "---\nstatus: done\n---\n# Title\nbody\n");
    }

    #[test]
    fn process_frontmatter_noop_leaves_plain_document() {
        let vault = MemoryVault::with_documents("mem", [("n.md", "plain")]).unwrap();
        vault.process_frontmatter("n.md", &mut |_| {}).unwrap();
        assert_eq!(vault.read("n.md").unwrap(), "plain");
    }

    #[test]
    fn delete_folder_removes_children() {
        let vault = MemoryVault::with_documents("mem", [("a/b.md", "x"), ("c.md", "y")]).unwrap();
        vault.delete("a").unwrap();
        assert_eq!(vault.list().unwrap(), vec!["c.md"]);
    }
}
