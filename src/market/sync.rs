use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    compose::compositor::MockupVariant,
    foundation::core::{ListingId, MockupId},
    foundation::error::MockupResult,
    market::listing::{ListingImage, ListingService},
};

/// Pacing and limits for listing writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOptions {
    /// Pause between successive write calls.
    pub write_delay: Duration,
    /// Bound on every individual marketplace call.
    pub call_timeout: Duration,
    /// Most images a listing may hold at once.
    pub max_images: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            write_delay: Duration::from_millis(250),
            call_timeout: Duration::from_secs(30),
            max_images: 10,
        }
    }
}

/// One mockup to publish.
#[derive(Clone, Debug)]
pub struct SyncEntry {
    pub mockup_id: MockupId,
    pub kind: MockupVariant,
    pub mime: &'static str,
    pub bytes: Arc<Vec<u8>>,
}

/// A mockup that made it onto the listing.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SyncedImage {
    pub mockup_id: MockupId,
    pub kind: MockupVariant,
    pub rank: u32,
    pub external_image_id: String,
    pub external_cdn_url: Option<String>,
}

/// Result of [`upload_mockups`]. Partial success is still a report, not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncReport {
    pub uploaded: Vec<SyncedImage>,
    pub failed: usize,
    pub removed: usize,
    /// Entries beyond the listing's image limit.
    pub dropped: usize,
}

async fn bounded<T>(limit: Duration, fut: impl Future<Output = MockupResult<T>>) -> MockupResult<T> {
    tokio::time::timeout(limit, fut).await?
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Replace a listing's images with `entries` without ever leaving it empty.
///
/// With `has_existing_images`, the last current image is kept as a placeholder while
/// the others are removed; it is deleted only after at least one new image landed.
/// Individual upload or delete failures are logged and skipped. Only a failure to list
/// the current images aborts, and it does so before any write.
#[tracing::instrument(skip(service, token, entries, opts), fields(entries = entries.len()))]
pub async fn upload_mockups(
    service: &dyn ListingService,
    token: &str,
    listing: ListingId,
    entries: &[SyncEntry],
    has_existing_images: bool,
    opts: &SyncOptions,
) -> MockupResult<SyncReport> {
    let mut report = SyncReport::default();

    let mut placeholder: Option<ListingImage> = None;
    if has_existing_images {
        let mut current = bounded(opts.call_timeout, service.list_images(token, listing)).await?;
        placeholder = current.pop();
        for image in &current {
            match bounded(opts.call_timeout, service.delete_image(token, listing, &image.image_id))
                .await
            {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    tracing::warn!(%listing, image_id = %image.image_id, error = %e, "failed to remove old image");
                }
            }
            pause(opts.write_delay).await;
        }
    }

    let capacity = opts.max_images.max(1);
    let wanted = entries.len().min(capacity);
    report.dropped = entries.len() - wanted;
    if report.dropped > 0 {
        tracing::warn!(%listing, dropped = report.dropped, "listing image limit reached");
    }

    for (idx, entry) in entries[..wanted].iter().enumerate() {
        let attached = report.uploaded.len() + usize::from(placeholder.is_some());
        if attached >= capacity {
            remove_placeholder(service, token, listing, &mut placeholder, &mut report, opts).await;
            if placeholder.is_some() {
                report.dropped += wanted - idx;
                break;
            }
        }

        let rank = idx as u32 + 1;
        let upload = service.upload_image(
            token,
            listing,
            entry.bytes.as_ref().clone(),
            entry.mime,
            rank,
        );
        match bounded(opts.call_timeout, upload).await {
            Ok(uploaded) => {
                tracing::debug!(%listing, rank, image_id = %uploaded.image_id, "uploaded mockup");
                report.uploaded.push(SyncedImage {
                    mockup_id: entry.mockup_id,
                    kind: entry.kind,
                    rank,
                    external_image_id: uploaded.image_id,
                    external_cdn_url: uploaded.url,
                });
            }
            Err(e) => {
                tracing::warn!(%listing, rank, mockup_id = %entry.mockup_id, error = %e, "mockup upload failed");
                report.failed += 1;
            }
        }
        pause(opts.write_delay).await;
    }

    remove_placeholder(service, token, listing, &mut placeholder, &mut report, opts).await;
    Ok(report)
}

async fn remove_placeholder(
    service: &dyn ListingService,
    token: &str,
    listing: ListingId,
    placeholder: &mut Option<ListingImage>,
    report: &mut SyncReport,
    opts: &SyncOptions,
) {
    let Some(image_id) = placeholder.as_ref().map(|p| p.image_id.clone()) else {
        return;
    };
    if report.uploaded.is_empty() {
        return;
    }
    match bounded(opts.call_timeout, service.delete_image(token, listing, &image_id)).await {
        Ok(()) => {
            report.removed += 1;
            *placeholder = None;
        }
        Err(e) => {
            tracing::warn!(%listing, %image_id, error = %e, "failed to remove placeholder image");
        }
    }
    pause(opts.write_delay).await;
}

#[cfg(test)]
#[path = "../../tests/unit/market/sync.rs"]
mod tests;
