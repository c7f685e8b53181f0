// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed build registry
//!
//! Each build is stored as `<build-id>.json` in a single directory. Builds are
//! created by dropping a file into the directory; the controller only rewrites
//! files that already exist.

use super::{BuildRegistry, RegistryError};
use async_trait::async_trait;
use kiln_core::{Build, BuildId, Selector};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry storing one JSON document per build
#[derive(Clone, Debug)]
pub struct JsonDirRegistry {
    dir: Arc<PathBuf>,
}

impl JsonDirRegistry {
    /// Open a registry directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir: Arc::new(dir) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store a new build
    pub async fn create(&self, build: &Build) -> Result<(), RegistryError> {
        let path = self.path_for(&build.id)?;
        if tokio::fs::try_exists(&path).await? {
            return Err(RegistryError::AlreadyExists(build.id.clone()));
        }
        self.write(&path, build).await
    }

    /// Read one build by id
    pub async fn get(&self, id: &BuildId) -> Result<Build, RegistryError> {
        let path = self.path_for(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => parse(&path, &bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RegistryError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, id: &BuildId) -> Result<PathBuf, RegistryError> {
        let name = id.0.as_str();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains('\0')
        {
            return Err(RegistryError::InvalidId(id.clone()));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    /// Write through a temp file and rename so readers never see a partial record
    async fn write(&self, path: &Path, build: &Build) -> Result<(), RegistryError> {
        let bytes = serde_json::to_vec_pretty(build)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", build.id));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn parse(path: &Path, bytes: &[u8]) -> Result<Build, RegistryError> {
    serde_json::from_slice(bytes).map_err(|source| RegistryError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn is_record(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    !hidden && path.extension().and_then(|e| e.to_str()) == Some("json")
}

#[async_trait]
impl BuildRegistry for JsonDirRegistry {
    async fn list(&self, selector: &Selector) -> Result<Vec<Build>, RegistryError> {
        let mut entries = tokio::fs::read_dir(self.dir.as_path()).await?;
        let mut builds = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_record(&path) {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                // Removed between read_dir and read
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            // One unreadable record must not hide the rest of the registry
            match parse(&path, &bytes) {
                Ok(build) if selector.matches(&build.labels) => builds.push(build),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "skipping build record"),
            }
        }

        builds.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(builds)
    }

    async fn update(&self, build: &Build) -> Result<(), RegistryError> {
        let path = self.path_for(&build.id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(RegistryError::NotFound(build.id.clone()));
        }
        self.write(&path, build).await
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
