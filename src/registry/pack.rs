use crate::foundation::core::{PackId, TemplateId};

/// Named, ordered set of templates plus a color-grade preset, applied together.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pack {
    pub id: PackId,
    pub name: String,
    /// Member templates; position is the rank.
    pub template_ids: Vec<TemplateId>,
    /// Color-grade preset id (`none` for identity).
    pub grade: String,
}

/// Input for creating a pack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewPack {
    pub name: String,
    #[serde(default)]
    pub template_ids: Vec<TemplateId>,
    #[serde(default = "default_grade")]
    pub grade: String,
}

fn default_grade() -> String {
    crate::grade::preset::NONE_PRESET.to_string()
}

/// Partial pack edit; `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PackUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub template_ids: Option<Vec<TemplateId>>,
    #[serde(default)]
    pub grade: Option<String>,
}

impl PackUpdate {
    /// Whether applying this edit to `pack` changes what its mockups look like.
    pub fn changes_output_of(&self, pack: &Pack) -> bool {
        let templates_changed = self
            .template_ids
            .as_ref()
            .is_some_and(|ids| *ids != pack.template_ids);
        let grade_changed = self
            .grade
            .as_ref()
            .is_some_and(|g| !g.trim().eq_ignore_ascii_case(&pack.grade));
        templates_changed || grade_changed
    }
}
