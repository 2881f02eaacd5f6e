use crate::{
    compose::blend::BlendMode,
    foundation::core::{Point, TemplateId},
    foundation::error::{MockupError, MockupResult},
    geometry::zone::Corners,
};

/// Typed scene/zone description: where a poster goes inside a scene photo.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TemplateGeometry {
    pub name: String,
    /// Scene raster reference (URL or path understood by the fetcher).
    pub scene_ref: String,
    /// Virtual scene width the corners were authored against.
    pub scene_width: u32,
    /// Virtual scene height the corners were authored against.
    pub scene_height: u32,
    /// Destination quadrilateral in `TL, TR, BR, BL` order.
    #[serde(serialize_with = "serialize_corners")]
    pub corners: Corners,
    pub blend_mode: BlendMode,
}

fn serialize_corners<S: serde::Serializer>(corners: &Corners, s: S) -> Result<S::Ok, S::Error> {
    use serde::Serialize as _;
    corners.map(|p| [p.x, p.y]).serialize(s)
}

/// Wire form of a template geometry, validated into [`TemplateGeometry`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateSpec {
    pub name: String,
    pub scene_ref: String,
    pub scene_width: u32,
    pub scene_height: u32,
    pub corners: Vec<[f64; 2]>,
    #[serde(default)]
    pub blend_mode: BlendMode,
}

impl TemplateSpec {
    pub fn validate(&self) -> MockupResult<TemplateGeometry> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MockupError::validation("template name must be non-empty"));
        }
        if self.scene_ref.trim().is_empty() {
            return Err(MockupError::validation("template scene_ref must be non-empty"));
        }
        if self.scene_width == 0 || self.scene_height == 0 {
            return Err(MockupError::validation(
                "template scene_width and scene_height must be > 0",
            ));
        }
        if self.corners.len() != 4 {
            return Err(MockupError::validation(format!(
                "template must have exactly 4 corners, got {}",
                self.corners.len()
            )));
        }
        if self.corners.iter().flatten().any(|v| !v.is_finite()) {
            return Err(MockupError::validation(
                "template corner coordinates must be finite",
            ));
        }

        let corners: Corners = std::array::from_fn(|i| {
            let [x, y] = self.corners[i];
            Point::new(x, y)
        });

        Ok(TemplateGeometry {
            name: name.to_string(),
            scene_ref: self.scene_ref.trim().to_string(),
            scene_width: self.scene_width,
            scene_height: self.scene_height,
            corners,
            blend_mode: self.blend_mode,
        })
    }
}

impl From<&TemplateGeometry> for TemplateSpec {
    fn from(g: &TemplateGeometry) -> Self {
        Self {
            name: g.name.clone(),
            scene_ref: g.scene_ref.clone(),
            scene_width: g.scene_width,
            scene_height: g.scene_height,
            corners: g.corners.iter().map(|p| [p.x, p.y]).collect(),
            blend_mode: g.blend_mode,
        }
    }
}

/// Stored template.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Template {
    pub id: TemplateId,
    #[serde(flatten)]
    pub geometry: TemplateGeometry,
    /// Member of the default template set used when no pack is given.
    pub active: bool,
    /// Position inside the active set.
    pub rank: u32,
}

#[cfg(test)]
#[path = "../../tests/unit/registry/template.rs"]
mod tests;
