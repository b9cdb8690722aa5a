use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_yaml::{Mapping, Value};

use super::ObjectStore;
use crate::{
    error::StoreError,
    policy::{HostPolicy, ObjectRef, Verdict},
};

/// Object store backed by a directory of YAML manifests, one policy per file
///
/// Status writes rewrite the manifest in place via a temporary file and rename,
/// so readers never observe a half-written manifest. Only `status.policyStatus`
/// and `metadata.resourceVersion` are touched; every other key of the manifest
/// is written back as it was read, including keys the policy model does not
/// know about. Comments are not kept.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Manifest paths in the store directory, sorted
    async fn manifests(&self) -> Result<Vec<PathBuf>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if entry.file_type().await.map_err(io_err)?.is_file() && is_manifest(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    async fn read(path: &Path) -> Result<Manifest, StoreError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let parse_err = |source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let document: Value = serde_yaml::from_str(&content).map_err(parse_err)?;
        let policy = serde_yaml::from_value(document.clone()).map_err(parse_err)?;
        Ok(Manifest {
            path: path.to_path_buf(),
            document,
            policy,
        })
    }

    async fn write(path: &Path, content: String) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let tmp = tmp_path(path);
        tokio::fs::write(&tmp, content).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)
    }

    /// Locate the manifest holding `reference`
    ///
    /// Manifests that fail to parse are skipped, they cannot hold the reference.
    async fn find(&self, reference: &ObjectRef) -> Result<Manifest, StoreError> {
        for path in self.manifests().await? {
            match Self::read(&path).await {
                Ok(manifest) if manifest.policy.reference() == *reference => return Ok(manifest),
                Ok(_) => {}
                Err(StoreError::Parse { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Err(StoreError::NotFound(reference.clone()))
    }
}

/// A manifest as read from disk: the raw document and its typed view
struct Manifest {
    path: PathBuf,
    document: Value,
    policy: HostPolicy,
}

impl Manifest {
    /// Set the verdict and resource version in the raw document
    ///
    /// Returns `None` when the document root or `metadata` is not a mapping.
    fn set_status(&mut self, verdict: Option<Verdict>, resource_version: u64) -> Option<()> {
        let root = self.document.as_mapping_mut()?;
        root.get_mut("metadata")?
            .as_mapping_mut()?
            .insert("resourceVersion".into(), resource_version.into());

        let status = root.entry("status".into()).or_insert(Value::Null);
        if !status.is_mapping() {
            *status = Value::Mapping(Mapping::new());
        }
        let status = status.as_mapping_mut()?;
        match verdict {
            Some(verdict) => status.insert("policyStatus".into(), verdict.to_string().into()),
            None => status.remove("policyStatus"),
        };
        Some(())
    }
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

#[async_trait]
impl ObjectStore for FileStore {
    async fn get(&self, reference: &ObjectRef) -> Result<HostPolicy, StoreError> {
        self.find(reference).await.map(|manifest| manifest.policy)
    }

    async fn list(&self) -> Result<Vec<HostPolicy>, StoreError> {
        let mut policies = Vec::new();
        for path in self.manifests().await? {
            match Self::read(&path).await {
                Ok(manifest) => policies.push(manifest.policy),
                Err(err @ StoreError::Parse { .. }) => {
                    log::warn!("Skipping manifest: {err}");
                }
                // Removed between read_dir and read
                Err(StoreError::Io { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(policies)
    }

    async fn update_status(&self, policy: &HostPolicy) -> Result<(), StoreError> {
        let reference = policy.reference();
        let mut manifest = self.find(&reference).await?;

        let found = manifest.policy.metadata.resource_version;
        if found != policy.metadata.resource_version {
            return Err(StoreError::Conflict {
                reference,
                expected: policy.metadata.resource_version,
                found,
            });
        }

        if manifest
            .set_status(policy.status.policy_status, found + 1)
            .is_none()
        {
            return Err(StoreError::Parse {
                path: manifest.path,
                source: serde::de::Error::custom("manifest root and metadata must be mappings"),
            });
        }
        let content = serde_yaml::to_string(&manifest.document)
            .map_err(|source| StoreError::Serialize { reference, source })?;
        Self::write(&manifest.path, content).await
    }

    async fn delete(&self, reference: &ObjectRef) -> Result<(), StoreError> {
        let Manifest { path, .. } = self.find(reference).await?;
        if let Err(source) = tokio::fs::remove_file(&path).await {
            return Err(StoreError::Io { path, source });
        }
        Ok(())
    }
}
