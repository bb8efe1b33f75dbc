//! Vault file access.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read access to the user's note vault.
///
/// Paths are vault-relative and already normalized.
#[async_trait]
pub trait VaultReader: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, VaultError>;
}

/// A vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a vault path onto the filesystem. Anything that would climb out
    /// of the root, or names the root itself, resolves to nothing.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (depth > 0).then_some(resolved)
    }
}

#[async_trait]
impl VaultReader for FsVault {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        let full = self
            .resolve(path)
            .ok_or_else(|| VaultError::NotFound(path.to_string()))?;

        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(VaultError::NotFound(path.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultError::NotFound(path.to_string()));
            }
            Err(source) => {
                return Err(VaultError::Io {
                    path: path.to_string(),
                    source,
                });
            }
        }

        tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| VaultError::Io {
                path: path.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault_with_note() -> (tempfile::TempDir, FsVault) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Project")).unwrap();
        std::fs::write(dir.path().join("Project/notes.md"), "# Notes\nship it").unwrap();
        let vault = FsVault::new(dir.path());
        (dir, vault)
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let (_dir, vault) = vault_with_note();
        let text = vault.read("Project/notes.md").await.unwrap();
        assert_eq!(text, "# Notes\nship it");
    }

    #[tokio::test]
    async fn missing_file_and_folders_are_not_found() {
        let (_dir, vault) = vault_with_note();
        assert!(matches!(
            vault.read("Project/missing.md").await,
            Err(VaultError::NotFound(_))
        ));
        assert!(matches!(vault.read("Project").await, Err(VaultError::NotFound(_))));
        assert!(matches!(vault.read("/").await, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn parent_traversal_is_refused() {
        let (dir, vault) = vault_with_note();
        let outside = dir.path().parent().unwrap().join("outside.md");
        let _ = std::fs::write(&outside, "secret");

        let result = vault.read("../outside.md").await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
        let _ = std::fs::remove_file(outside);
    }
}
