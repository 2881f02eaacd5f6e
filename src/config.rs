use std::{path::Path, time::Duration};

use crate::{
    compose::{compositor::ComposeSettings, raster::OutputFormat},
    foundation::error::{MockupError, MockupResult},
    market::sync::SyncOptions,
};

/// Engine tunables, loadable from a JSON file. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub fetch_timeout_secs: u64,
    pub marketplace_timeout_secs: u64,
    pub write_delay_ms: u64,
    pub max_listing_images: usize,
    pub output_format: OutputFormat,
    pub jpeg_quality: u8,
    pub letterbox_rgb: [u8; 3],
    pub min_zone_px: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            marketplace_timeout_secs: 30,
            write_delay_ms: 250,
            max_listing_images: 10,
            output_format: OutputFormat::Jpeg,
            jpeg_quality: 92,
            letterbox_rgb: [255, 255, 255],
            min_zone_px: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> MockupResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| MockupError::validation(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> MockupResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MockupError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> MockupResult<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(MockupError::validation("jpeg_quality must be in 1..=100"));
        }
        if self.max_listing_images == 0 {
            return Err(MockupError::validation("max_listing_images must be positive"));
        }
        if self.fetch_timeout_secs == 0 || self.marketplace_timeout_secs == 0 {
            return Err(MockupError::validation("timeouts must be positive"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn marketplace_timeout(&self) -> Duration {
        Duration::from_secs(self.marketplace_timeout_secs)
    }

    pub fn compose_settings(&self) -> ComposeSettings {
        ComposeSettings {
            output_format: self.output_format,
            jpeg_quality: self.jpeg_quality,
            background_rgb: self.letterbox_rgb,
            min_zone_px: self.min_zone_px,
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            write_delay: Duration::from_millis(self.write_delay_ms),
            call_timeout: self.marketplace_timeout(),
            max_images: self.max_listing_images,
        }
    }
}
