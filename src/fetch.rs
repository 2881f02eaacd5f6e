//! Raster retrieval for posters and scene images.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

use async_trait::async_trait;

use crate::foundation::error::{MockupError, MockupResult};

/// Resolves a raster reference (URL or path) to encoded bytes.
#[async_trait]
pub trait RasterFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> MockupResult<Vec<u8>>;
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Fetches `http(s)://` references over the network and everything else from disk.
///
/// Every fetch is bounded by `timeout`; failures surface as [`MockupError::External`]
/// so callers can record them per item.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    root: PathBuf,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, root: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            root: root.into(),
        }
    }

    fn local_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl RasterFetcher for HttpFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, reference: &str) -> MockupResult<Vec<u8>> {
        if is_remote(reference) {
            let resp = self
                .client
                .get(reference)
                .timeout(self.timeout)
                .send()
                .await?
                .error_for_status()?;
            let bytes = tokio::time::timeout(self.timeout, resp.bytes()).await??;
            return Ok(bytes.to_vec());
        }

        let path = self.local_path(reference);
        tokio::time::timeout(self.timeout, tokio::fs::read(&path))
            .await?
            .map_err(|e| MockupError::external(format!("read '{}': {e}", path.display())))
    }
}

/// In-memory fetcher keyed by exact reference string.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reference: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(reference.into(), bytes);
        }
    }

    pub fn remove(&self, reference: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(reference);
        }
    }
}

#[async_trait]
impl RasterFetcher for StaticFetcher {
    async fn fetch(&self, reference: &str) -> MockupResult<Vec<u8>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| MockupError::external("static fetcher lock poisoned"))?;
        entries
            .get(reference)
            .cloned()
            .ok_or_else(|| MockupError::external(format!("no raster registered for '{reference}'")))
    }
}
