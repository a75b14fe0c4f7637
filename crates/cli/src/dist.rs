//! The exported bundle directory read during manifest generation.

use async_trait::async_trait;
use bytes::Bytes;
use ota_core::manifest::AssetSource;
use ota_core::{Manifest, Platform};
use std::io;
use std::path::{Component, Path, PathBuf};
use time::OffsetDateTime;

/// Directory the manifests are written to, relative to the export directory.
pub const MANIFESTS_DIR: &str = "manifests";

/// An export directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct DistDirectory {
    root: PathBuf,
}

impl DistDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a descriptor path, refusing anything outside the directory.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches("./"));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || path.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes export directory: {path}"),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Write each manifest to `manifests/<platform>.json`.
    pub async fn write_manifests(&self, manifests: &[(Platform, Manifest)]) -> io::Result<Vec<PathBuf>> {
        let dir = self.root.join(MANIFESTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let mut written = Vec::with_capacity(manifests.len());
        for (platform, manifest) in manifests {
            let path = dir.join(format!("{platform}.json"));
            let json = manifest
                .to_json()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            tokio::fs::write(&path, json).await?;
            written.push(path);
        }
        Ok(written)
    }
}

#[async_trait]
impl AssetSource for DistDirectory {
    async fn read(&self, path: &str) -> io::Result<Bytes> {
        let path = self.resolve(path)?;
        Ok(Bytes::from(tokio::fs::read(path).await?))
    }

    /// Birth time where the filesystem records it, else modification time.
    async fn created_at(&self, path: &str) -> io::Result<OffsetDateTime> {
        let meta = tokio::fs::metadata(self.resolve(path)?).await?;
        let time = meta.created().or_else(|_| meta.modified())?;
        Ok(OffsetDateTime::from(time))
    }
}
