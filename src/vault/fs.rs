//! Filesystem-backed vault rooted at a directory.

use std::path::{Path, PathBuf};

use super::{normalize_path, parent_folder, DocumentStore, Entry, VaultError};

/// A vault stored as plain files under `root`.
///
/// Hidden files and folders (names starting with `.`) are never listed, which
/// keeps editor state like `.obsidian/` and `.git/` out of results.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    name: String,
}

impl FsVault {
    /// Open a vault at `root`. The directory must exist.
    pub fn open(root: impl Into<PathBuf>, name: Option<String>) -> Result<Self, VaultError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(VaultError::NotDirectory(root.display().to_string()));
        }

        let name = name.filter(|n| !n.is_empty()).unwrap_or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "vault".to_string())
        });

        tracing::info!(root = %root.display(), name = %name, "vault opened");
        Ok(Self { root, name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<(String, PathBuf), VaultError> {
        let normalized = normalize_path(path)?;
        let full = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment));
        Ok((normalized, full))
    }

    fn resolve_document(&self, path: &str) -> Result<(String, PathBuf), VaultError> {
        let (normalized, full) = self.resolve(path)?;
        if normalized.is_empty() {
            return Err(VaultError::InvalidPath(path.to_string()));
        }
        Ok((normalized, full))
    }

    fn collect(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), VaultError> {
        let entries = std::fs::read_dir(dir).map_err(|source| io_error(dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| io_error(dir, source))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }

            let rel = if prefix.is_empty() {
                file_name
            } else {
                format!("{prefix}/{file_name}")
            };

            let file_type = entry
                .file_type()
                .map_err(|source| io_error(&entry.path(), source))?;
            if file_type.is_dir() {
                self.collect(&entry.path(), &rel, out)?;
            } else if file_type.is_file() {
                out.push(rel);
            }
        }
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> VaultError {
    VaultError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl DocumentStore for FsVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<String>, VaultError> {
        let mut out = Vec::new();
        self.collect(&self.root, "", &mut out)?;
        out.sort();
        Ok(out)
    }

    fn list_under(&self, prefix: &str) -> Result<Vec<String>, VaultError> {
        let (normalized, full) = self.resolve(prefix)?;
        match self.lookup(&normalized)? {
            Some(Entry::Directory) => {}
            Some(Entry::File) => return Err(VaultError::NotDirectory(normalized)),
            None => return Err(VaultError::NotFound(normalized)),
        }

        let mut out = Vec::new();
        self.collect(&full, &normalized, &mut out)?;
        out.sort();
        Ok(out)
    }

    fn lookup(&self, path: &str) -> Result<Option<Entry>, VaultError> {
        let (_, full) = self.resolve(path)?;
        match std::fs::metadata(&full) {
            Ok(meta) if meta.is_dir() => Ok(Some(Entry::Directory)),
            Ok(_) => Ok(Some(Entry::File)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(&full, source)),
        }
    }

    fn read(&self, path: &str) -> Result<String, VaultError> {
        let (normalized, full) = self.resolve_document(path)?;
        let bytes = std::fs::read(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => VaultError::NotFound(normalized.clone()),
            _ => io_error(&full, source),
        })?;
        String::from_utf8(bytes).map_err(|_| VaultError::NotText(normalized))
    }

    fn create(&self, path: &str, text: &str) -> Result<(), VaultError> {
        let (normalized, full) = self.resolve_document(path)?;
        if full.exists() {
            return Err(VaultError::AlreadyExists(normalized));
        }
        if let Some(parent) = parent_folder(&normalized) {
            self.ensure_folder(parent)?;
        }
        std::fs::write(&full, text).map_err(|source| io_error(&full, source))?;
        tracing::debug!(path = %normalized, bytes = text.len(), "document created");
        Ok(())
    }

    fn modify(&self, path: &str, text: &str) -> Result<(), VaultError> {
        let (normalized, full) = self.resolve_document(path)?;
        match self.lookup(&normalized)? {
            Some(Entry::File) => {}
            Some(Entry::Directory) => return Err(VaultError::IsDirectory(normalized)),
            None => return Err(VaultError::NotFound(normalized)),
        }

        // Atomic replace: write a sibling temp file, then rename over the original.
        let tmp = full.with_extension("noteport.tmp");
        std::fs::write(&tmp, text).map_err(|source| io_error(&tmp, source))?;
        std::fs::rename(&tmp, &full).map_err(|source| io_error(&full, source))?;
        tracing::debug!(path = %normalized, bytes = text.len(), "document modified");
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), VaultError> {
        let (normalized, full) = self.resolve_document(path)?;
        let removed = match self.lookup(&normalized)? {
            Some(Entry::File) => std::fs::remove_file(&full),
            Some(Entry::Directory) => std::fs::remove_dir_all(&full),
            None => return Err(VaultError::NotFound(normalized)),
        };
        removed.map_err(|source| io_error(&full, source))?;
        tracing::debug!(path = %normalized, "path deleted");
        Ok(())
    }

    fn ensure_folder(&self, path: &str) -> Result<(), VaultError> {
        let (normalized, full) = self.resolve(path)?;
        if let Some(Entry::File) = self.lookup(&normalized)? {
            return Err(VaultError::NotDirectory(normalized));
        }
        std::fs::create_dir_all(&full).map_err(|source| io_error(&full, source))
    }
}
