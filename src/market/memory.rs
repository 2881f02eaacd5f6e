//! In-process listing service for dry runs and tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    foundation::core::ListingId,
    foundation::error::{MockupError, MockupResult},
    market::listing::{ListingImage, ListingService, UploadedImage},
};

#[derive(Debug, Default)]
struct State {
    listings: HashMap<ListingId, Vec<ListingImage>>,
    next_id: u64,
    /// Image count of a listing after every call that touched it.
    observed: HashMap<ListingId, Vec<usize>>,
    failing_ranks: HashSet<u32>,
    failing_list: bool,
}

impl State {
    fn observe(&mut self, listing: ListingId) {
        let count = self.listings.get(&listing).map_or(0, Vec::len);
        self.observed.entry(listing).or_default().push(count);
    }
}

fn renumber(images: &mut [ListingImage]) {
    for (i, image) in images.iter_mut().enumerate() {
        image.rank = i as u32 + 1;
    }
}

/// Listing service that keeps images in memory and records the image count after
/// every call, with switches to make uploads or listing fail.
#[derive(Debug, Default)]
pub struct InMemoryListingService {
    state: Mutex<State>,
}

impl InMemoryListingService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MockupResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| MockupError::external("listing state lock poisoned"))
    }

    /// Attach `count` pre-existing images to `listing`, returning their ids.
    pub fn seed(&self, listing: ListingId, count: usize) -> Vec<String> {
        let Ok(mut state) = self.state() else {
            return Vec::new();
        };
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            state.next_id += 1;
            let image_id = format!("seed-{}", state.next_id);
            ids.push(image_id.clone());
            let images = state.listings.entry(listing).or_default();
            images.push(ListingImage {
                image_id,
                rank: 0,
                url: None,
            });
            renumber(images);
        }
        ids
    }

    pub fn images(&self, listing: ListingId) -> Vec<ListingImage> {
        self.state()
            .ok()
            .and_then(|s| s.listings.get(&listing).cloned())
            .unwrap_or_default()
    }

    pub fn observed_counts(&self, listing: ListingId) -> Vec<usize> {
        self.state()
            .ok()
            .and_then(|s| s.observed.get(&listing).cloned())
            .unwrap_or_default()
    }

    /// Make uploads at `rank` fail.
    pub fn fail_uploads_at(&self, rank: u32) {
        if let Ok(mut state) = self.state() {
            state.failing_ranks.insert(rank);
        }
    }

    pub fn fail_listing(&self, fail: bool) {
        if let Ok(mut state) = self.state() {
            state.failing_list = fail;
        }
    }
}

#[async_trait]
impl ListingService for InMemoryListingService {
    async fn list_images(&self, _token: &str, listing: ListingId) -> MockupResult<Vec<ListingImage>> {
        let mut state = self.state()?;
        if state.failing_list {
            return Err(MockupError::external("listing unavailable"));
        }
        state.observe(listing);
        Ok(state.listings.get(&listing).cloned().unwrap_or_default())
    }

    async fn upload_image(
        &self,
        _token: &str,
        listing: ListingId,
        _bytes: Vec<u8>,
        _mime: &str,
        rank: u32,
    ) -> MockupResult<UploadedImage> {
        let mut state = self.state()?;
        if state.failing_ranks.contains(&rank) {
            state.observe(listing);
            return Err(MockupError::external(format!("upload at rank {rank} rejected")));
        }
        state.next_id += 1;
        let image_id = format!("img-{}", state.next_id);
        let url = Some(format!("memory://{listing}/{image_id}"));

        let images = state.listings.entry(listing).or_default();
        let at = (rank.max(1) as usize - 1).min(images.len());
        images.insert(
            at,
            ListingImage {
                image_id: image_id.clone(),
                rank,
                url: url.clone(),
            },
        );
        renumber(images);
        state.observe(listing);
        Ok(UploadedImage { image_id, url })
    }

    async fn delete_image(&self, _token: &str, listing: ListingId, image_id: &str) -> MockupResult<()> {
        let mut state = self.state()?;
        let images = state.listings.entry(listing).or_default();
        let before = images.len();
        images.retain(|i| i.image_id != image_id);
        let removed = images.len() != before;
        renumber(images);
        state.observe(listing);
        if removed {
            Ok(())
        } else {
            Err(MockupError::external(format!(
                "image {image_id} is not on listing {listing}"
            )))
        }
    }
}
