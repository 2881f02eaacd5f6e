use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use crate::{
    compose::compositor::{Compositor, SkippedTemplate},
    foundation::core::{PackId, SourceId, TemplateId},
    foundation::error::{MockupError, MockupResult},
    geometry::fit::FillMode,
    market::{
        listing::ListingService,
        sync::{SyncEntry, SyncOptions, upload_mockups},
    },
    registry::{
        source::{ResolvedTemplates, TemplateSource},
        store::Registry,
    },
    store::{
        artworks::{ArtworkStatus, ArtworkStore, SourceArtwork},
        catalog::{CatalogService, MarketplaceAuth},
        mockups::{ComposedMockup, ExternalImage, MultiMockupStore, NewMockup},
    },
    workflow::{
        locks::ArtworkLocks,
        status::{Action, transition},
    },
};

/// Which half of an approval failed.
#[derive(thiserror::Error, Debug)]
pub enum ApproveError {
    /// Refused before any work: unknown artwork, illegal state or no templates.
    #[error(transparent)]
    Rejected(#[from] MockupError),
    /// Composing or storing the mockups failed. Existing mockups are untouched.
    #[error("composition failed: {0}")]
    Composition(MockupError),
}

impl ApproveError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Composition(_) => "composition",
        }
    }

    pub fn inner(&self) -> &MockupError {
        match self {
            Self::Rejected(e) | Self::Composition(e) => e,
        }
    }
}

/// Outcome of publishing mockups to the marketplace listing.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    /// No product, or the product's listing is not published.
    NotLinked,
    /// Every mockup is excluded from the marketplace channel.
    NothingToSync,
    Synced { uploaded: usize, failed: usize },
    Failed { message: String },
}

impl SyncStatus {
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// What an approval or reapply produced.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ApprovalOutcome {
    pub source_id: SourceId,
    pub status: ArtworkStatus,
    pub mockups: Vec<ComposedMockup>,
    pub skipped: Vec<SkippedTemplate>,
    pub sync: SyncStatus,
}

/// One failed item of [`ApprovalWorkflow::approve_batch`].
#[derive(Clone, Debug, serde::Serialize)]
pub struct BatchFailure {
    pub source_id: SourceId,
    pub stage: &'static str,
    pub error: String,
}

/// Aggregate of [`ApprovalWorkflow::approve_batch`].
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct BatchOutcome {
    pub approved: Vec<ApprovalOutcome>,
    pub failed: Vec<BatchFailure>,
}

/// Collaborators the workflow drives.
pub struct WorkflowDeps {
    pub registry: Arc<Registry>,
    pub compositor: Arc<Compositor>,
    pub mockups: Arc<dyn MultiMockupStore>,
    pub artworks: Arc<dyn ArtworkStore>,
    pub catalog: Arc<dyn CatalogService>,
    pub auth: Arc<dyn MarketplaceAuth>,
    pub listings: Arc<dyn ListingService>,
    pub sync: SyncOptions,
}

/// Drives artworks from pending to approved, composing mockups and publishing them.
pub struct ApprovalWorkflow {
    deps: WorkflowDeps,
    locks: ArtworkLocks,
}

struct Stored {
    rows: Vec<ComposedMockup>,
    skipped: Vec<SkippedTemplate>,
}

/// Holds an artwork's lock while it is `generating`.
///
/// Dropped before [`Generating::settle`] (a cancelled request, a failed store call),
/// it flags the artwork `needs_attention` and only then releases the lock, so the
/// artwork never stays `generating` and no later pass observes the half-done state.
struct Generating {
    artworks: Arc<dyn ArtworkStore>,
    source_id: SourceId,
    lock: Option<OwnedMutexGuard<()>>,
}

impl Generating {
    async fn enter(
        artworks: &Arc<dyn ArtworkStore>,
        source_id: SourceId,
        lock: OwnedMutexGuard<()>,
    ) -> MockupResult<Self> {
        artworks
            .set_status(source_id, ArtworkStatus::Generating)
            .await?;
        Ok(Self {
            artworks: Arc::clone(artworks),
            source_id,
            lock: Some(lock),
        })
    }

    /// Leave `generating` for `status`. On failure the drop path still flags the artwork.
    async fn settle(mut self, status: ArtworkStatus) -> MockupResult<OwnedMutexGuard<()>> {
        self.artworks.set_status(self.source_id, status).await?;
        self.lock.take().ok_or_else(|| {
            MockupError::Other(anyhow::anyhow!("artwork lock already released"))
        })
    }
}

impl Drop for Generating {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };
        let source_id = self.source_id;
        tracing::warn!(%source_id, "approval interrupted while generating");
        let artworks = Arc::clone(&self.artworks);
        let restore = async move {
            if let Err(e) = artworks
                .set_status(source_id, ArtworkStatus::NeedsAttention)
                .await
            {
                tracing::warn!(%source_id, error = %e, "could not flag artwork");
            }
            drop(lock);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(restore);
            }
            Err(_) => tracing::error!(%source_id, "no runtime to flag interrupted artwork"),
        }
    }
}

impl ApprovalWorkflow {
    pub fn new(deps: WorkflowDeps) -> Self {
        Self {
            deps,
            locks: ArtworkLocks::new(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.deps.registry
    }

    pub fn artworks(&self) -> &Arc<dyn ArtworkStore> {
        &self.deps.artworks
    }

    pub fn mockups(&self) -> &Arc<dyn MultiMockupStore> {
        &self.deps.mockups
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogService> {
        &self.deps.catalog
    }

    pub fn compositor(&self) -> &Arc<Compositor> {
        &self.deps.compositor
    }

    /// Compose the artwork against a pack (or the active templates), replace its
    /// mockups, mark it approved and publish to its listing when there is one.
    ///
    /// A composition failure leaves the artwork `needs_attention` with its previous
    /// mockups intact. A sync failure is reported in [`ApprovalOutcome::sync`] and
    /// does not undo the approval.
    #[tracing::instrument(skip(self, excluded))]
    pub async fn approve(
        &self,
        source_id: SourceId,
        excluded: &[TemplateId],
        pack_id: Option<PackId>,
    ) -> Result<ApprovalOutcome, ApproveError> {
        let lock = self.locks.lock(source_id).await;

        let artwork = self.deps.artworks.get(source_id).await?;
        let target = transition(artwork.status, Action::Approve)?;
        let resolved = TemplateSource::from_pack(pack_id)
            .resolve(&self.deps.registry)
            .await?
            .exclude(excluded)?;

        let generating = Generating::enter(&self.deps.artworks, source_id, lock).await?;

        let stored = match self.compose_and_store(&artwork, &resolved).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(%source_id, error = %e, "composition failed");
                generating
                    .settle(ArtworkStatus::NeedsAttention)
                    .await
                    .map_err(ApproveError::Composition)?;
                return Err(ApproveError::Composition(e));
            }
        };

        self.deps
            .artworks
            .set_primary_mockup(source_id, stored.rows.first().map(|m| m.id))
            .await
            .map_err(ApproveError::Composition)?;
        let _lock = generating
            .settle(target)
            .await
            .map_err(ApproveError::Composition)?;

        let sync = self.sync_listing(&artwork, &stored.rows).await;
        tracing::info!(%source_id, mockups = stored.rows.len(), ?sync, "artwork approved");

        Ok(ApprovalOutcome {
            source_id,
            status: target,
            mockups: self.deps.mockups.get(source_id).await?,
            skipped: stored.skipped,
            sync,
        })
    }

    /// Flag an artwork for attention. Nothing else changes.
    #[tracing::instrument(skip(self))]
    pub async fn decline(&self, source_id: SourceId) -> MockupResult<SourceArtwork> {
        let _guard = self.locks.lock(source_id).await;
        let artwork = self.deps.artworks.get(source_id).await?;
        let target = transition(artwork.status, Action::Decline)?;
        self.deps.artworks.set_status(source_id, target).await
    }

    /// Send a flagged or declined artwork back to pending, dropping its legacy
    /// mockup reference.
    #[tracing::instrument(skip(self))]
    pub async fn retry(&self, source_id: SourceId) -> MockupResult<SourceArtwork> {
        let _guard = self.locks.lock(source_id).await;
        let artwork = self.deps.artworks.get(source_id).await?;
        let target = transition(artwork.status, Action::Retry)?;
        self.deps.artworks.set_primary_mockup(source_id, None).await?;
        self.deps.artworks.set_status(source_id, target).await
    }

    /// Approve each artwork in turn; one failure never stops the rest.
    #[tracing::instrument(skip(self, source_ids), fields(items = source_ids.len()))]
    pub async fn approve_batch(&self, source_ids: &[SourceId], pack_id: Option<PackId>) -> BatchOutcome {
        let mut out = BatchOutcome::default();
        for &source_id in source_ids {
            match self.approve(source_id, &[], pack_id).await {
                Ok(outcome) => out.approved.push(outcome),
                Err(e) => {
                    tracing::warn!(%source_id, stage = e.stage(), error = %e, "batch item failed");
                    out.failed.push(BatchFailure {
                        source_id,
                        stage: e.stage(),
                        error: e.inner().to_string(),
                    });
                }
            }
        }
        out
    }

    /// Recompose and republish an approved artwork without changing its status.
    ///
    /// Without an explicit `source` the pack its current mockups came from is reused,
    /// falling back to the active templates.
    #[tracing::instrument(skip(self))]
    pub async fn reapply(
        &self,
        source_id: SourceId,
        source: Option<TemplateSource>,
    ) -> Result<ApprovalOutcome, ApproveError> {
        let _guard = self.locks.lock(source_id).await;

        let artwork = self.deps.artworks.get(source_id).await?;
        let status = transition(artwork.status, Action::Reapply)?;
        let source = match source {
            Some(source) => source,
            None => {
                let current = self.deps.mockups.get(source_id).await?;
                TemplateSource::from_pack(current.iter().find_map(|m| m.pack_id))
            }
        };
        let resolved = source.resolve(&self.deps.registry).await?;

        let stored = self
            .compose_and_store(&artwork, &resolved)
            .await
            .map_err(ApproveError::Composition)?;
        self.deps
            .artworks
            .set_primary_mockup(source_id, stored.rows.first().map(|m| m.id))
            .await
            .map_err(ApproveError::Composition)?;

        let sync = self.sync_listing(&artwork, &stored.rows).await;
        Ok(ApprovalOutcome {
            source_id,
            status,
            mockups: self.deps.mockups.get(source_id).await?,
            skipped: stored.skipped,
            sync,
        })
    }

    /// Compose first, then swap the stored set wholesale.
    async fn compose_and_store(
        &self,
        artwork: &SourceArtwork,
        resolved: &ResolvedTemplates,
    ) -> MockupResult<Stored> {
        let batch = self
            .deps
            .compositor
            .compose_all(
                &artwork.image_url,
                &resolved.templates,
                FillMode::Fill,
                &resolved.grade,
            )
            .await?;
        if batch.entries.is_empty() {
            return Err(MockupError::raster(format!(
                "none of {} templates produced a mockup",
                resolved.templates.len()
            )));
        }

        self.deps.mockups.delete_all(artwork.id).await?;

        let mime = self.deps.compositor.settings().output_format.mime();
        let mut rows = Vec::with_capacity(batch.entries.len());
        for (idx, entry) in batch.entries.into_iter().enumerate() {
            let row = self
                .deps
                .mockups
                .save(NewMockup {
                    source_id: artwork.id,
                    template_id: entry.template_id,
                    pack_id: resolved.pack_id,
                    variant: entry.variant,
                    rank: idx as u32 + 1,
                    mime,
                    data: entry.bytes,
                })
                .await?;
            rows.push(row);
        }

        Ok(Stored {
            rows,
            skipped: batch.skipped,
        })
    }

    /// Replace the listing's images with the marketplace-included rows.
    ///
    /// The listing's current images are always listed first: rows are recreated on
    /// every pass, so they cannot tell what an earlier, partly failed sync left behind.
    async fn sync_listing(&self, artwork: &SourceArtwork, rows: &[ComposedMockup]) -> SyncStatus {
        let Some(product_id) = artwork.product_id else {
            return SyncStatus::NotLinked;
        };
        let listing = match self.deps.catalog.listing_for(product_id).await {
            Ok(Some(listing)) if listing.published => listing,
            Ok(_) => return SyncStatus::NotLinked,
            Err(e) => return failed(artwork.id, e),
        };

        let entries: Vec<SyncEntry> = rows
            .iter()
            .filter(|m| m.include_marketplace)
            .map(|m| SyncEntry {
                mockup_id: m.id,
                kind: m.variant,
                mime: m.mime,
                bytes: Arc::clone(&m.data),
            })
            .collect();
        if entries.is_empty() {
            return SyncStatus::NothingToSync;
        }

        let token = match self.deps.auth.access_token().await {
            Ok(token) => token,
            Err(e) => return failed(artwork.id, e),
        };
        let report = match upload_mockups(
            self.deps.listings.as_ref(),
            &token,
            listing.listing_id,
            &entries,
            true,
            &self.deps.sync,
        )
        .await
        {
            Ok(report) => report,
            Err(e) => return failed(artwork.id, e),
        };

        for image in &report.uploaded {
            let external = ExternalImage {
                image_id: image.external_image_id.clone(),
                url: image.external_cdn_url.clone(),
            };
            if let Err(e) = self.deps.mockups.set_external(image.mockup_id, Some(external)).await {
                tracing::warn!(mockup_id = %image.mockup_id, error = %e, "could not record external image");
            }
        }

        if report.uploaded.is_empty() {
            return failed(
                artwork.id,
                MockupError::external("the marketplace accepted none of the mockups"),
            );
        }
        SyncStatus::Synced {
            uploaded: report.uploaded.len(),
            failed: report.failed,
        }
    }
}

fn failed(source_id: SourceId, e: MockupError) -> SyncStatus {
    tracing::warn!(%source_id, error = %e, "marketplace sync failed");
    SyncStatus::Failed {
        message: e.to_string(),
    }
}
