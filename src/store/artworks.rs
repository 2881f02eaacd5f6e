use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    foundation::core::{IdSeq, MockupId, ProductId, SourceId},
    foundation::error::{MockupError, MockupResult},
};

/// Workflow state of a source artwork.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkStatus {
    #[default]
    Pending,
    Generating,
    Approved,
    NeedsAttention,
    Declined,
}

impl ArtworkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Approved => "approved",
            Self::NeedsAttention => "needs_attention",
            Self::Declined => "declined",
        }
    }
}

impl std::fmt::Display for ArtworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated poster and its workflow state.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SourceArtwork {
    pub id: SourceId,
    pub image_url: String,
    pub status: ArtworkStatus,
    pub product_id: Option<ProductId>,
    /// Legacy single-mockup reference kept for older consumers.
    pub primary_mockup: Option<MockupId>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a finished artwork.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct NewArtwork {
    pub image_url: String,
    #[serde(default)]
    pub product_id: Option<ProductId>,
}

#[async_trait]
pub trait ArtworkStore: Send + Sync {
    async fn insert(&self, new: NewArtwork) -> MockupResult<SourceArtwork>;

    async fn get(&self, id: SourceId) -> MockupResult<SourceArtwork>;

    async fn set_status(&self, id: SourceId, status: ArtworkStatus) -> MockupResult<SourceArtwork>;

    async fn set_primary_mockup(&self, id: SourceId, mockup: Option<MockupId>) -> MockupResult<()>;

    async fn list_by_status(&self, status: ArtworkStatus) -> MockupResult<Vec<SourceArtwork>>;
}

/// In-process [`ArtworkStore`].
#[derive(Debug, Default)]
pub struct InMemoryArtworkStore {
    rows: RwLock<BTreeMap<SourceId, SourceArtwork>>,
    ids: IdSeq,
}

impl InMemoryArtworkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtworkStore for InMemoryArtworkStore {
    async fn insert(&self, new: NewArtwork) -> MockupResult<SourceArtwork> {
        if new.image_url.trim().is_empty() {
            return Err(MockupError::validation("artwork image url must be non-empty"));
        }
        let artwork = SourceArtwork {
            id: SourceId(self.ids.next()),
            image_url: new.image_url,
            status: ArtworkStatus::Pending,
            product_id: new.product_id,
            primary_mockup: None,
            updated_at: Utc::now(),
        };
        self.rows.write().await.insert(artwork.id, artwork.clone());
        Ok(artwork)
    }

    async fn get(&self, id: SourceId) -> MockupResult<SourceArtwork> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| MockupError::not_found("artwork", id))
    }

    async fn set_status(&self, id: SourceId, status: ArtworkStatus) -> MockupResult<SourceArtwork> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| MockupError::not_found("artwork", id))?;
        row.status = status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn set_primary_mockup(&self, id: SourceId, mockup: Option<MockupId>) -> MockupResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| MockupError::not_found("artwork", id))?;
        row.primary_mockup = mockup;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn list_by_status(&self, status: ArtworkStatus) -> MockupResult<Vec<SourceArtwork>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect())
    }
}
