use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use anyhow::anyhow;
use image::{Rgba, RgbaImage, imageops};

use crate::{
    compose::{
        blend::{blend_onto, flatten},
        raster::{self, OutputFormat},
    },
    fetch::RasterFetcher,
    foundation::core::{Point, TemplateId},
    foundation::error::{MockupError, MockupResult},
    geometry::{
        fit::{FillMode, apply_fill},
        perspective::{Projective, solve_perspective, warp},
        zone::{localize, pixel_bounds, scale_corners, zone_ratio},
    },
    grade::{
        apply::apply_grade,
        preset::{ColorGrade, is_none_preset},
    },
    registry::template::{Template, TemplateGeometry},
};

/// Zones wider or taller than this are refused rather than allocated.
const MAX_ZONE_PX: f64 = 16_384.0;

/// Knobs for rasterizing and encoding mockups.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeSettings {
    pub output_format: OutputFormat,
    pub jpeg_quality: u8,
    /// Background for letterbox padding and final flattening.
    pub background_rgb: [u8; 3],
    /// Zones whose bounding box is narrower or shorter than this are skipped.
    pub min_zone_px: u32,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Jpeg,
            jpeg_quality: 92,
            background_rgb: [255, 255, 255],
            min_zone_px: 10,
        }
    }
}

/// Which flavor of a template's mockup an entry is.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MockupVariant {
    /// Composed with the pass's color grade (identity when the grade is `none`).
    #[default]
    Graded,
    /// Ungraded cover candidate added alongside a stylized set.
    Clean,
}

/// Why a template produced no mockup.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    ZoneTooSmall { width: u32, height: u32 },
    ZoneTooLarge { width: u32, height: u32 },
    SceneUnavailable { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZoneTooSmall { width, height } => write!(f, "zone too small ({width}x{height})"),
            Self::ZoneTooLarge { width, height } => write!(f, "zone too large ({width}x{height})"),
            Self::SceneUnavailable { message } => write!(f, "scene unavailable: {message}"),
        }
    }
}

/// Result of composing one template.
#[derive(Clone, Debug, PartialEq)]
pub enum ComposeOutcome {
    Composed(Vec<u8>),
    Skipped(SkipReason),
}

/// One encoded mockup produced by [`Compositor::compose_all`].
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedEntry {
    pub template_id: TemplateId,
    pub variant: MockupVariant,
    pub bytes: Vec<u8>,
}

/// A template that did not compose, with the reason.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SkippedTemplate {
    pub template_id: TemplateId,
    pub reason: SkipReason,
}

/// Everything a multi-template pass produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposeBatch {
    pub entries: Vec<ComposedEntry>,
    pub skipped: Vec<SkippedTemplate>,
}

/// Composite `poster` into `scene` through the template's zone.
///
/// Output is opaque and exactly the scene's pixel size. Zones whose bounding box is
/// below `min_zone_px` are reported as skipped. A degenerate zone (collinear or
/// coincident corners) falls back to an unwarped placement over the bounding box.
pub fn compose_rgba(
    poster: &RgbaImage,
    scene: &RgbaImage,
    geometry: &TemplateGeometry,
    fill: FillMode,
    settings: &ComposeSettings,
) -> Result<RgbaImage, SkipReason> {
    let [r, g, b] = settings.background_rgb;
    let fitted = apply_fill(
        poster,
        fill,
        zone_ratio(&geometry.corners),
        Rgba([r, g, b, 255]),
    );

    let sx = f64::from(scene.width()) / f64::from(geometry.scene_width.max(1));
    let sy = f64::from(scene.height()) / f64::from(geometry.scene_height.max(1));
    let corners = scale_corners(&geometry.corners, sx, sy);
    let bounds = pixel_bounds(&corners);

    let (bw, bh) = (bounds.width(), bounds.height());
    let min = f64::from(settings.min_zone_px);
    if !(bw >= min && bh >= min) {
        return Err(SkipReason::ZoneTooSmall {
            width: bw.max(0.0) as u32,
            height: bh.max(0.0) as u32,
        });
    }
    if bw > MAX_ZONE_PX || bh > MAX_ZONE_PX {
        return Err(SkipReason::ZoneTooLarge {
            width: bw as u32,
            height: bh as u32,
        });
    }
    let (bw, bh) = (bw as u32, bh as u32);

    let resized = imageops::resize(&*fitted, bw, bh, imageops::FilterType::CatmullRom);
    let src = [
        Point::new(0.0, 0.0),
        Point::new(f64::from(bw), 0.0),
        Point::new(f64::from(bw), f64::from(bh)),
        Point::new(0.0, f64::from(bh)),
    ];
    let dst = localize(&corners, Point::new(bounds.x0, bounds.y0));
    let transform = solve_perspective(&src, &dst).unwrap_or_else(|| {
        tracing::debug!(template = %geometry.name, "degenerate zone, placing poster unwarped");
        Projective::IDENTITY
    });
    let warped = warp(&resized, bw, bh, &transform);

    let mut out = scene.clone();
    blend_onto(
        &mut out,
        &warped,
        bounds.x0 as i64,
        bounds.y0 as i64,
        geometry.blend_mode,
    );
    flatten(&mut out, settings.background_rgb);
    Ok(out)
}

enum Rendered {
    Composed {
        bytes: Vec<u8>,
        clean: Option<Vec<u8>>,
    },
    Skipped(SkipReason),
}

/// Turns posters and templates into encoded mockups.
///
/// Scene rasters are fetched once and cached by reference; pixel work runs on the
/// blocking pool so async callers stay responsive.
pub struct Compositor {
    fetcher: Arc<dyn RasterFetcher>,
    settings: ComposeSettings,
    scenes: RwLock<HashMap<String, Arc<RgbaImage>>>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    pub fn new(fetcher: Arc<dyn RasterFetcher>, settings: ComposeSettings) -> Self {
        Self {
            fetcher,
            settings,
            scenes: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &ComposeSettings {
        &self.settings
    }

    /// Drop a cached scene so the next pass refetches it.
    pub fn forget_scene(&self, scene_ref: &str) {
        if let Ok(mut scenes) = self.scenes.write() {
            scenes.remove(scene_ref);
        }
    }

    /// Fetch and decode a poster.
    pub async fn load_poster(&self, poster_ref: &str) -> MockupResult<Arc<RgbaImage>> {
        let bytes = self.fetcher.fetch(poster_ref).await?;
        let img = run_blocking(move || raster::decode(&bytes)).await?;
        Ok(Arc::new(img))
    }

    async fn scene(&self, scene_ref: &str) -> MockupResult<Arc<RgbaImage>> {
        if let Some(hit) = self
            .scenes
            .read()
            .ok()
            .and_then(|scenes| scenes.get(scene_ref).cloned())
        {
            return Ok(hit);
        }

        let bytes = self.fetcher.fetch(scene_ref).await?;
        let img = Arc::new(run_blocking(move || raster::decode(&bytes)).await?);
        if let Ok(mut scenes) = self.scenes.write() {
            scenes.insert(scene_ref.to_string(), Arc::clone(&img));
        }
        Ok(img)
    }

    /// Compose a single mockup.
    pub async fn compose(
        &self,
        poster: Arc<RgbaImage>,
        template: &Template,
        fill: FillMode,
        grade: &ColorGrade,
    ) -> MockupResult<ComposeOutcome> {
        let grade = (!grade.is_identity()).then_some(*grade);
        match self.render(poster, template, fill, grade, false).await? {
            Rendered::Composed { bytes, .. } => Ok(ComposeOutcome::Composed(bytes)),
            Rendered::Skipped(reason) => Ok(ComposeOutcome::Skipped(reason)),
        }
    }

    /// Compose `poster_ref` into every template.
    ///
    /// Per-template failures are recorded in [`ComposeBatch::skipped`] and never abort
    /// siblings. With a grade other than `none`, one extra ungraded
    /// [`MockupVariant::Clean`] entry is appended last, captured from the first template
    /// that composed successfully.
    #[tracing::instrument(skip(self, templates), fields(templates = templates.len()))]
    pub async fn compose_all(
        &self,
        poster_ref: &str,
        templates: &[Template],
        fill: FillMode,
        grade_id: &str,
    ) -> MockupResult<ComposeBatch> {
        let poster = self.load_poster(poster_ref).await?;
        let graded = !is_none_preset(grade_id);
        let grade = graded.then(|| ColorGrade::resolve_lenient(grade_id));

        let mut batch = ComposeBatch::default();
        let mut clean: Option<ComposedEntry> = None;

        for template in templates {
            let capture_clean = graded && clean.is_none();
            let rendered = self
                .render(Arc::clone(&poster), template, fill, grade, capture_clean)
                .await;

            match rendered {
                Ok(Rendered::Composed { bytes, clean: c }) => {
                    batch.entries.push(ComposedEntry {
                        template_id: template.id,
                        variant: MockupVariant::Graded,
                        bytes,
                    });
                    if let Some(c) = c {
                        clean = Some(ComposedEntry {
                            template_id: template.id,
                            variant: MockupVariant::Clean,
                            bytes: c,
                        });
                    }
                }
                Ok(Rendered::Skipped(reason)) => {
                    tracing::warn!(template_id = %template.id, %reason, "template skipped");
                    batch.skipped.push(SkippedTemplate {
                        template_id: template.id,
                        reason,
                    });
                }
                Err(e) => {
                    tracing::warn!(template_id = %template.id, error = %e, "template failed");
                    batch.skipped.push(SkippedTemplate {
                        template_id: template.id,
                        reason: SkipReason::SceneUnavailable {
                            message: e.to_string(),
                        },
                    });
                }
            }
        }

        if let Some(c) = clean {
            batch.entries.push(c);
        }
        Ok(batch)
    }

    async fn render(
        &self,
        poster: Arc<RgbaImage>,
        template: &Template,
        fill: FillMode,
        grade: Option<ColorGrade>,
        capture_clean: bool,
    ) -> MockupResult<Rendered> {
        let scene = self.scene(&template.geometry.scene_ref).await?;
        let geometry = template.geometry.clone();
        let settings = self.settings.clone();

        run_blocking(move || {
            let mut img = match compose_rgba(&poster, &scene, &geometry, fill, &settings) {
                Ok(img) => img,
                Err(reason) => return Ok(Rendered::Skipped(reason)),
            };
            let clean = if capture_clean {
                Some(raster::encode(
                    &img,
                    settings.output_format,
                    settings.jpeg_quality,
                )?)
            } else {
                None
            };
            if let Some(grade) = grade {
                apply_grade(&mut img, &grade);
            }
            let bytes = raster::encode(&img, settings.output_format, settings.jpeg_quality)?;
            Ok(Rendered::Composed { bytes, clean })
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> MockupResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> MockupResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MockupError::Other(anyhow!("compose task failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
