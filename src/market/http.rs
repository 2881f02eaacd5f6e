use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::{
    foundation::core::ListingId,
    foundation::error::{MockupError, MockupResult},
    market::listing::{ListingImage, ListingService, UploadedImage},
};

#[derive(Debug, serde::Deserialize)]
struct ImageList {
    results: Vec<ListingImage>,
}

/// REST client for the marketplace's listing-image endpoints.
///
/// Paths are `{base_url}/shops/{shop_id}/listings/{listing}/images[/{image_id}]`.
#[derive(Clone, Debug)]
pub struct HttpListingService {
    client: reqwest::Client,
    base_url: String,
    shop_id: String,
    api_key: String,
    timeout: Duration,
}

impl HttpListingService {
    pub fn new(
        base_url: impl Into<String>,
        shop_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            shop_id: shop_id.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    fn images_url(&self, listing: ListingId) -> String {
        format!(
            "{}/shops/{}/listings/{listing}/images",
            self.base_url, self.shop_id
        )
    }

    fn request(&self, method: reqwest::Method, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .timeout(self.timeout)
            .bearer_auth(token)
            .header("x-api-key", &self.api_key)
    }
}

async fn checked(resp: reqwest::Response) -> MockupResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(MockupError::external(format!(
        "marketplace returned {status}: {}",
        body.chars().take(200).collect::<String>()
    )))
}

#[async_trait]
impl ListingService for HttpListingService {
    async fn list_images(&self, token: &str, listing: ListingId) -> MockupResult<Vec<ListingImage>> {
        let resp = self
            .request(reqwest::Method::GET, &self.images_url(listing), token)
            .send()
            .await?;
        let list: ImageList = checked(resp).await?.json().await?;
        let mut images = list.results;
        images.sort_by_key(|i| i.rank);
        Ok(images)
    }

    async fn upload_image(
        &self,
        token: &str,
        listing: ListingId,
        bytes: Vec<u8>,
        mime: &str,
        rank: u32,
    ) -> MockupResult<UploadedImage> {
        let ext = match mime {
            "image/png" => "png",
            _ => "jpg",
        };
        let part = Part::bytes(bytes)
            .file_name(format!("mockup-{rank}.{ext}"))
            .mime_str(mime)?;
        let form = Form::new().text("rank", rank.to_string()).part("image", part);

        let resp = self
            .request(reqwest::Method::POST, &self.images_url(listing), token)
            .multipart(form)
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    async fn delete_image(&self, token: &str, listing: ListingId, image_id: &str) -> MockupResult<()> {
        let url = format!("{}/{image_id}", self.images_url(listing));
        let resp = self
            .request(reqwest::Method::DELETE, &url, token)
            .send()
            .await?;
        checked(resp).await?;
        Ok(())
    }
}
