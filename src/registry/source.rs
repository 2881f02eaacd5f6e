use crate::{
    foundation::core::{PackId, TemplateId},
    foundation::error::{MockupError, MockupResult},
    grade::preset::NONE_PRESET,
    registry::{store::Registry, template::Template},
};

/// Where the template set for a composition pass comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "pack_id", rename_all = "snake_case")]
pub enum TemplateSource {
    /// A pack's ordered templates and its color grade.
    Pack(PackId),
    /// The registry's active template set, ungraded.
    ActiveTemplates,
}

impl TemplateSource {
    pub fn from_pack(pack_id: Option<PackId>) -> Self {
        pack_id.map_or(Self::ActiveTemplates, Self::Pack)
    }

    pub fn pack_id(&self) -> Option<PackId> {
        match self {
            Self::Pack(id) => Some(*id),
            Self::ActiveTemplates => None,
        }
    }

    /// Resolve to `(templates, grade preset id)`.
    ///
    /// An empty result is a validation error: there is nothing to compose.
    pub async fn resolve(&self, registry: &Registry) -> MockupResult<ResolvedTemplates> {
        let (templates, grade) = match self {
            Self::Pack(id) => {
                let pack = registry.pack(*id).await?;
                let templates = registry.templates_by_ids(&pack.template_ids).await;
                (templates, pack.grade)
            }
            Self::ActiveTemplates => (
                registry.active_templates().await,
                NONE_PRESET.to_string(),
            ),
        };

        if templates.is_empty() {
            return Err(MockupError::validation(match self {
                Self::Pack(id) => format!("pack {id} has no templates"),
                Self::ActiveTemplates => "no active templates configured".to_string(),
            }));
        }

        Ok(ResolvedTemplates {
            templates,
            grade,
            pack_id: self.pack_id(),
        })
    }
}

/// Output of [`TemplateSource::resolve`].
#[derive(Clone, Debug)]
pub struct ResolvedTemplates {
    pub templates: Vec<Template>,
    pub grade: String,
    pub pack_id: Option<PackId>,
}

impl ResolvedTemplates {
    /// Remove excluded templates; empty afterwards is a validation error.
    pub fn exclude(mut self, excluded: &[TemplateId]) -> MockupResult<Self> {
        self.templates.retain(|t| !excluded.contains(&t.id));
        if self.templates.is_empty() {
            return Err(MockupError::validation(
                "every resolved template was excluded",
            ));
        }
        Ok(self)
    }
}
