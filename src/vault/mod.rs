//! Document store adapter.
//!
//! Provides the [`DocumentStore`] trait the rest of the crate talks to, the
//! [`Entry`] lookup type, and two implementations: [`fs::FsVault`] (a directory
//! on disk) and [`memory::MemoryVault`] (an in-process map). The frontmatter
//! rewrite primitive lives in [`frontmatter`].

pub mod frontmatter;
pub mod fs;
pub mod memory;

use serde_json::{Map, Value};
use thiserror::Error;

/// What a path resolves to inside the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    File,
    Directory,
}

/// Errors raised by a [`DocumentStore`].
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path is a directory, not a file: {0}")]
    IsDirectory(String),

    #[error("Path is not a directory: {0}")]
    NotDirectory(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("File is not valid UTF-8 text: {0}")]
    NotText(String),

    #[error("Invalid frontmatter in {path}: {message}")]
    InvalidFrontmatter { path: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Hierarchical store of text documents addressed by `/`-separated paths.
///
/// All methods are synchronous. Callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait DocumentStore: Send + Sync {
    /// Display name of the vault (reported by `/health`).
    fn name(&self) -> &str;

    /// Every document path, sorted.
    fn list(&self) -> Result<Vec<String>, VaultError>;

    /// Every document path below `prefix` (recursive), sorted.
    fn list_under(&self, prefix: &str) -> Result<Vec<String>, VaultError>;

    /// Resolve a path to a file or directory, `None` if nothing is there.
    fn lookup(&self, path: &str) -> Result<Option<Entry>, VaultError>;

    fn read(&self, path: &str) -> Result<String, VaultError>;

    /// Create a new document. Fails if one already exists at `path`.
    fn create(&self, path: &str, text: &str) -> Result<(), VaultError>;

    /// Overwrite an existing document.
    fn modify(&self, path: &str, text: &str) -> Result<(), VaultError>;

    fn delete(&self, path: &str) -> Result<(), VaultError>;

    /// Create a folder and any missing parents. No-op if it exists.
    fn ensure_folder(&self, path: &str) -> Result<(), VaultError>;

    /// Rewrite a document's frontmatter mapping in place.
    ///
    /// The mutator receives the parsed mapping (empty if the document has no
    /// frontmatter). The body after the frontmatter block is written back
    /// untouched, untouched keys keep their order and original YAML values,
    /// and the block is always re-serialised as valid YAML.
    fn process_frontmatter(
        &self,
        path: &str,
        mutate: &mut dyn FnMut(&mut Map<String, Value>),
    ) -> Result<(), VaultError> {
        let text = self.read(path)?;
        let split = frontmatter::split(&text);
        let mut mapping =
            frontmatter::parse(split.yaml).map_err(|message| VaultError::InvalidFrontmatter {
                path: path.to_string(),
                message,
            })?;
        let had_block = split.yaml.is_some();

        mutate(&mut mapping);

        if !had_block && mapping.is_empty() {
            return Ok(());
        }

        let rendered =
            frontmatter::render(&mapping, split.yaml, split.body).map_err(|message| {
                VaultError::InvalidFrontmatter {
                    path: path.to_string(),
                    message,
                }
            })?;
        self.modify(path, &rendered)
    }

    /// Read a path that must be a file, with a precise error otherwise.
    fn read_file(&self, path: &str) -> Result<String, VaultError> {
        match self.lookup(path)? {
            Some(Entry::File) => self.read(path),
            Some(Entry::Directory) => Err(VaultError::IsDirectory(path.to_string())),
            None => Err(VaultError::NotFound(path.to_string())),
        }
    }
}

/// Validate and normalise a vault-relative path.
///
/// Strips leading/trailing `/`, collapses empty and `.` segments, and rejects
/// `..`, backslashes, and NUL bytes. The vault root is `""`.
pub fn normalize_path(path: &str) -> Result<String, VaultError> {
    if path.contains('\0') || path.contains('\\') {
        return Err(VaultError::InvalidPath(path.to_string()));
    }

    let mut parts = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(VaultError::InvalidPath(path.to_string())),
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

/// Parent folder of a normalised path, `None` for top-level documents.
pub fn parent_folder(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_slashes_and_dots() {
        assert_eq!(normalize_path("/notes/./daily/").unwrap(), "notes/daily");
        assert_eq!(normalize_path("a//b.md").unwrap(), "a/b.md");
        assert_eq!(normalize_path("").unwrap(), "");
    }

    #[test]
    fn normalize_rejects_traversal() {
        assert!(matches!(
            normalize_path("../etc/passwd"),
            Err(VaultError::InvalidPath(_))
        ));
        assert!(matches!(
            normalize_path("notes/../../x"),
            Err(VaultError::InvalidPath(_))
        ));
        assert!(normalize_path("a\\b").is_err());
    }

    #[test]
    fn parent_folder_of_nested_and_top_level() {
        assert_eq!(parent_folder("a/b/c.md"), Some("a/b"));
        assert_eq!(parent_folder("c.md"), None);
    }
}
