//! File-backed rate store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::RatesResult;
use crate::publisher::{RatePublication, RatePublisher};

/// Write `bytes` to `path` so readers see either the old or the new content.
///
/// Data goes to a sibling temp file first and is renamed into place.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Persists the latest publication as a JSON document:
/// `{"base": .., "last_updated": <unix seconds>, "conversion_rates": {..}}`.
pub struct JsonFileRateStore {
    path: PathBuf,
}

impl JsonFileRateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored publication. A missing file means nothing was
    /// published yet.
    pub async fn load(&self) -> RatesResult<Option<RatePublication>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let publication = serde_json::from_slice(&bytes)?;
                debug!(path = %self.path.display(), "Loaded stored rates");
                Ok(Some(publication))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RatePublisher for JsonFileRateStore {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn publish(&self, publication: &RatePublication) -> RatesResult<()> {
        let bytes = serde_json::to_vec_pretty(publication)?;
        write_atomic(&self.path, &bytes).await?;

        info!(
            path = %self.path.display(),
            rates = publication.conversion_rates.len(),
            "Stored rates"
        );
        Ok(())
    }
}
