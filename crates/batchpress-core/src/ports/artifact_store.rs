//! ArtifactStore port - where derived images and output tables land.

use std::path::PathBuf;

use async_trait::async_trait;
use ulid::Ulid;

use crate::error::PipelineError;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store bytes under a fresh unique reference and return that reference.
    async fn put(&self, bytes: &[u8], ext: &str) -> Result<String, PipelineError>;

    /// Read back a previously stored artifact.
    async fn get(&self, artifact_ref: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Filesystem-backed store: one ULID-named file per artifact under a root
/// directory. The returned reference is the file name, not the full path, so
/// references stay stable if the root moves.
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, bytes: &[u8], ext: &str) -> Result<String, PipelineError> {
        let name = format!("{}.{ext}", Ulid::new());
        tokio::fs::write(self.root.join(&name), bytes).await?;
        Ok(name)
    }

    async fn get(&self, artifact_ref: &str) -> Result<Vec<u8>, PipelineError> {
        let bytes = tokio::fs::read(self.root.join(artifact_ref)).await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        store.ensure_root().await.unwrap();

        let artifact_ref = store.put(b"payload", "jpg").await.unwrap();
        assert!(artifact_ref.ends_with(".jpg"));

        let back = store.get(&artifact_ref).await.unwrap();
        assert_eq!(back, b"payload");
    }

    #[tokio::test]
    async fn references_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        store.ensure_root().await.unwrap();

        let a = store.put(b"a", "jpg").await.unwrap();
        let b = store.put(b"a", "jpg").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn missing_artifact_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let err = store.get("nope.jpg").await.unwrap_err();
        assert!(matches!(err, PipelineError::Artifact(_)));
    }
}
