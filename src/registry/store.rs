use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::{
    foundation::core::{IdSeq, PackId, TemplateId},
    foundation::error::{MockupError, MockupResult},
    grade::preset::ColorGrade,
    registry::{
        pack::{NewPack, Pack, PackUpdate},
        template::{Template, TemplateSpec},
    },
};

/// Serializable registry contents, used for seeding and export.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct RegistrySeed {
    #[serde(default)]
    pub templates: Vec<SeedTemplate>,
    #[serde(default)]
    pub packs: Vec<SeedPack>,
}

/// Template entry of a [`RegistrySeed`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SeedTemplate {
    pub id: TemplateId,
    #[serde(flatten)]
    pub spec: TemplateSpec,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub rank: u32,
}

/// Pack entry of a [`RegistrySeed`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SeedPack {
    pub id: PackId,
    #[serde(flatten)]
    pub pack: NewPack,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default)]
struct Inner {
    templates: BTreeMap<TemplateId, Template>,
    packs: BTreeMap<PackId, Pack>,
}

/// Template and pack registry.
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<Inner>,
    template_ids: IdSeq,
    pack_ids: IdSeq,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a seed, keeping the seed's ids.
    pub fn from_seed(seed: RegistrySeed) -> MockupResult<Self> {
        let registry = Self::new();
        {
            let mut inner = registry.inner.try_write().map_err(|e| {
                MockupError::Other(anyhow::anyhow!("fresh registry is locked: {e}"))
            })?;
            for t in seed.templates {
                let geometry = t.spec.validate()?;
                registry.template_ids.observe(t.id.0);
                inner.templates.insert(
                    t.id,
                    Template {
                        id: t.id,
                        geometry,
                        active: t.active,
                        rank: t.rank,
                    },
                );
            }
            for p in seed.packs {
                let pack = validate_new_pack(&inner, p.id, p.pack)?;
                registry.pack_ids.observe(p.id.0);
                inner.packs.insert(p.id, pack);
            }
        }
        Ok(registry)
    }

    pub async fn export(&self) -> RegistrySeed {
        let inner = self.inner.read().await;
        RegistrySeed {
            templates: inner
                .templates
                .values()
                .map(|t| SeedTemplate {
                    id: t.id,
                    spec: TemplateSpec::from(&t.geometry),
                    active: t.active,
                    rank: t.rank,
                })
                .collect(),
            packs: inner
                .packs
                .values()
                .map(|p| SeedPack {
                    id: p.id,
                    pack: NewPack {
                        name: p.name.clone(),
                        template_ids: p.template_ids.clone(),
                        grade: p.grade.clone(),
                    },
                })
                .collect(),
        }
    }

    // --- templates ---

    pub async fn create_template(
        &self,
        spec: &TemplateSpec,
        active: bool,
        rank: u32,
    ) -> MockupResult<Template> {
        let geometry = spec.validate()?;
        let id = TemplateId(self.template_ids.next());
        let template = Template {
            id,
            geometry,
            active,
            rank,
        };
        self.inner
            .write()
            .await
            .templates
            .insert(id, template.clone());
        tracing::info!(template_id = %id, "template created");
        Ok(template)
    }

    pub async fn template(&self, id: TemplateId) -> MockupResult<Template> {
        self.inner
            .read()
            .await
            .templates
            .get(&id)
            .cloned()
            .ok_or_else(|| MockupError::not_found("template", id))
    }

    pub async fn templates(&self) -> Vec<Template> {
        self.inner.read().await.templates.values().cloned().collect()
    }

    /// The default template set, ordered by rank then id.
    pub async fn active_templates(&self) -> Vec<Template> {
        let mut out: Vec<Template> = self
            .inner
            .read()
            .await
            .templates
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect();
        out.sort_by_key(|t| (t.rank, t.id));
        out
    }

    pub async fn update_template(
        &self,
        id: TemplateId,
        spec: &TemplateSpec,
    ) -> MockupResult<Template> {
        let geometry = spec.validate()?;
        let mut inner = self.inner.write().await;
        let template = inner
            .templates
            .get_mut(&id)
            .ok_or_else(|| MockupError::not_found("template", id))?;
        template.geometry = geometry;
        Ok(template.clone())
    }

    pub async fn set_template_active(
        &self,
        id: TemplateId,
        active: bool,
        rank: Option<u32>,
    ) -> MockupResult<Template> {
        let mut inner = self.inner.write().await;
        let template = inner
            .templates
            .get_mut(&id)
            .ok_or_else(|| MockupError::not_found("template", id))?;
        template.active = active;
        if let Some(rank) = rank {
            template.rank = rank;
        }
        Ok(template.clone())
    }

    /// Delete a template and drop it from every pack that referenced it.
    ///
    /// Returns the removed template and the packs it was removed from, in id order.
    pub async fn delete_template(&self, id: TemplateId) -> MockupResult<(Template, Vec<PackId>)> {
        let mut inner = self.inner.write().await;
        let template = inner
            .templates
            .remove(&id)
            .ok_or_else(|| MockupError::not_found("template", id))?;
        let mut touched = Vec::new();
        for pack in inner.packs.values_mut() {
            let before = pack.template_ids.len();
            pack.template_ids.retain(|t| *t != id);
            if pack.template_ids.len() != before {
                touched.push(pack.id);
            }
        }
        touched.sort();
        tracing::info!(template_id = %id, packs = touched.len(), "template deleted");
        Ok((template, touched))
    }

    /// Packs listing `id` among their templates, in id order.
    pub async fn packs_containing(&self, id: TemplateId) -> Vec<PackId> {
        let mut out: Vec<PackId> = self
            .inner
            .read()
            .await
            .packs
            .values()
            .filter(|p| p.template_ids.contains(&id))
            .map(|p| p.id)
            .collect();
        out.sort();
        out
    }

    /// Resolve ids to templates in the given order, skipping ids that no longer exist.
    pub async fn templates_by_ids(&self, ids: &[TemplateId]) -> Vec<Template> {
        let inner = self.inner.read().await;
        ids.iter()
            .filter_map(|id| inner.templates.get(id).cloned())
            .collect()
    }

    // --- packs ---

    pub async fn create_pack(&self, new: NewPack) -> MockupResult<Pack> {
        let mut inner = self.inner.write().await;
        let id = PackId(self.pack_ids.next());
        let pack = validate_new_pack(&inner, id, new)?;
        inner.packs.insert(id, pack.clone());
        tracing::info!(pack_id = %id, templates = pack.template_ids.len(), "pack created");
        Ok(pack)
    }

    pub async fn pack(&self, id: PackId) -> MockupResult<Pack> {
        self.inner
            .read()
            .await
            .packs
            .get(&id)
            .cloned()
            .ok_or_else(|| MockupError::not_found("pack", id))
    }

    pub async fn packs(&self) -> Vec<Pack> {
        self.inner.read().await.packs.values().cloned().collect()
    }

    /// Apply `update`, returning the new pack and whether composed output is invalidated.
    pub async fn update_pack(&self, id: PackId, update: PackUpdate) -> MockupResult<(Pack, bool)> {
        let mut inner = self.inner.write().await;
        let current = inner
            .packs
            .get(&id)
            .cloned()
            .ok_or_else(|| MockupError::not_found("pack", id))?;
        let invalidates = update.changes_output_of(&current);

        let candidate = NewPack {
            name: update.name.unwrap_or(current.name),
            template_ids: update.template_ids.unwrap_or(current.template_ids),
            grade: update.grade.unwrap_or(current.grade),
        };
        let pack = validate_new_pack(&inner, id, candidate)?;
        inner.packs.insert(id, pack.clone());
        Ok((pack, invalidates))
    }

    pub async fn delete_pack(&self, id: PackId) -> MockupResult<()> {
        match self.inner.write().await.packs.remove(&id) {
            Some(_) => Ok(()),
            None => Err(MockupError::not_found("pack", id)),
        }
    }
}

fn validate_new_pack(inner: &Inner, id: PackId, new: NewPack) -> MockupResult<Pack> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(MockupError::validation("pack name must be non-empty"));
    }
    ColorGrade::require(&new.grade)?;

    let mut seen = std::collections::HashSet::new();
    for t in &new.template_ids {
        if !inner.templates.contains_key(t) {
            return Err(MockupError::validation(format!(
                "pack references unknown template {t}"
            )));
        }
        if !seen.insert(*t) {
            return Err(MockupError::validation(format!(
                "pack lists template {t} more than once"
            )));
        }
    }

    Ok(Pack {
        id,
        name: name.to_string(),
        template_ids: new.template_ids,
        grade: new.grade.trim().to_ascii_lowercase(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/registry/store.rs"]
mod tests;
