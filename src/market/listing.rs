use async_trait::async_trait;

use crate::{foundation::core::ListingId, foundation::error::MockupResult};

/// An image currently attached to a marketplace listing.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListingImage {
    pub image_id: String,
    pub rank: u32,
    #[serde(default)]
    pub url: Option<String>,
}

/// What the marketplace returns for an accepted upload.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadedImage {
    pub image_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Image operations of the downstream listing service.
///
/// `rank` is 1-based; rank 1 is the listing's primary image.
#[async_trait]
pub trait ListingService: Send + Sync {
    async fn list_images(&self, token: &str, listing: ListingId) -> MockupResult<Vec<ListingImage>>;

    async fn upload_image(
        &self,
        token: &str,
        listing: ListingId,
        bytes: Vec<u8>,
        mime: &str,
        rank: u32,
    ) -> MockupResult<UploadedImage>;

    async fn delete_image(&self, token: &str, listing: ListingId, image_id: &str) -> MockupResult<()>;
}
