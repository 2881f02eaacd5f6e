use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    compose::compositor::MockupVariant,
    foundation::core::{Channel, IdSeq, MockupId, PackId, SourceId, TemplateId},
    foundation::error::{MockupError, MockupResult},
};

/// Marketplace-side identity of an uploaded mockup.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExternalImage {
    pub image_id: String,
    pub url: Option<String>,
}

/// A mockup about to be persisted.
#[derive(Clone, Debug)]
pub struct NewMockup {
    pub source_id: SourceId,
    pub template_id: TemplateId,
    pub pack_id: Option<PackId>,
    pub variant: MockupVariant,
    pub rank: u32,
    pub mime: &'static str,
    pub data: Vec<u8>,
}

/// A persisted composed mockup.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ComposedMockup {
    pub id: MockupId,
    pub source_id: SourceId,
    pub template_id: TemplateId,
    pub pack_id: Option<PackId>,
    pub variant: MockupVariant,
    pub rank: u32,
    pub mime: &'static str,
    #[serde(skip)]
    pub data: Arc<Vec<u8>>,
    pub include_marketplace: bool,
    pub include_storefront: bool,
    pub storefront_primary: bool,
    pub external: Option<ExternalImage>,
    pub created_at: DateTime<Utc>,
}

impl ComposedMockup {
    pub fn included_in(&self, channel: Channel) -> bool {
        match channel {
            Channel::Marketplace => self.include_marketplace,
            Channel::Storefront => self.include_storefront,
        }
    }
}

/// Persistence for composed mockups, unique per `(source, template, variant)`.
#[async_trait]
pub trait MultiMockupStore: Send + Sync {
    /// Upsert keyed by `(source, template, variant)`.
    ///
    /// New rows are included in every channel; the first row of a source becomes its
    /// storefront primary.
    async fn save(&self, new: NewMockup) -> MockupResult<ComposedMockup>;

    /// All mockups of a source, ordered by rank.
    async fn get(&self, source_id: SourceId) -> MockupResult<Vec<ComposedMockup>>;

    async fn get_by_id(&self, id: MockupId) -> MockupResult<ComposedMockup>;

    /// Remove every mockup of a source, returning how many were removed.
    async fn delete_all(&self, source_id: SourceId) -> MockupResult<usize>;

    async fn set_channel_inclusion(
        &self,
        id: MockupId,
        channel: Channel,
        included: bool,
    ) -> MockupResult<ComposedMockup>;

    /// Make `id` the storefront primary, clearing any other primary of the same source.
    async fn set_storefront_primary(&self, id: MockupId) -> MockupResult<ComposedMockup>;

    async fn set_external(&self, id: MockupId, external: Option<ExternalImage>) -> MockupResult<()>;

    /// Sources holding at least one mockup composed from `pack_id`.
    async fn sources_referencing_pack(&self, pack_id: PackId) -> MockupResult<Vec<SourceId>>;
}

#[derive(Debug, Default)]
struct Rows {
    by_id: BTreeMap<MockupId, ComposedMockup>,
    by_source: BTreeMap<SourceId, Vec<MockupId>>,
}

impl Rows {
    fn ids_of(&self, source_id: SourceId) -> Vec<MockupId> {
        self.by_source.get(&source_id).cloned().unwrap_or_default()
    }

    fn of_source(&self, source_id: SourceId) -> impl Iterator<Item = &ComposedMockup> {
        self.by_source
            .get(&source_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
    }

    fn insert(&mut self, row: ComposedMockup) {
        self.by_source.entry(row.source_id).or_default().push(row.id);
        self.by_id.insert(row.id, row);
    }

    fn remove_source(&mut self, source_id: SourceId) -> usize {
        let ids = self.by_source.remove(&source_id).unwrap_or_default();
        for id in &ids {
            self.by_id.remove(id);
        }
        ids.len()
    }

    fn get_mut(&mut self, id: MockupId) -> MockupResult<&mut ComposedMockup> {
        self.by_id
            .get_mut(&id)
            .ok_or_else(|| MockupError::not_found("mockup", id))
    }
}

/// In-process [`MultiMockupStore`].
#[derive(Debug, Default)]
pub struct InMemoryMockupStore {
    rows: RwLock<Rows>,
    ids: IdSeq,
}

impl InMemoryMockupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MultiMockupStore for InMemoryMockupStore {
    async fn save(&self, new: NewMockup) -> MockupResult<ComposedMockup> {
        let mut rows = self.rows.write().await;

        let existing = rows
            .of_source(new.source_id)
            .find(|m| m.template_id == new.template_id && m.variant == new.variant)
            .map(|m| m.id);
        if let Some(id) = existing {
            let row = rows.get_mut(id)?;
            row.pack_id = new.pack_id;
            row.rank = new.rank;
            row.mime = new.mime;
            row.data = Arc::new(new.data);
            row.external = None;
            return Ok(row.clone());
        }

        let has_primary = rows.of_source(new.source_id).any(|m| m.storefront_primary);
        let row = ComposedMockup {
            id: MockupId(self.ids.next()),
            source_id: new.source_id,
            template_id: new.template_id,
            pack_id: new.pack_id,
            variant: new.variant,
            rank: new.rank,
            mime: new.mime,
            data: Arc::new(new.data),
            include_marketplace: true,
            include_storefront: true,
            storefront_primary: !has_primary,
            external: None,
            created_at: Utc::now(),
        };
        rows.insert(row.clone());
        Ok(row)
    }

    async fn get(&self, source_id: SourceId) -> MockupResult<Vec<ComposedMockup>> {
        let rows = self.rows.read().await;
        let mut out: Vec<_> = rows.of_source(source_id).cloned().collect();
        out.sort_by_key(|m| (m.rank, m.id));
        Ok(out)
    }

    async fn get_by_id(&self, id: MockupId) -> MockupResult<ComposedMockup> {
        self.rows
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| MockupError::not_found("mockup", id))
    }

    async fn delete_all(&self, source_id: SourceId) -> MockupResult<usize> {
        Ok(self.rows.write().await.remove_source(source_id))
    }

    async fn set_channel_inclusion(
        &self,
        id: MockupId,
        channel: Channel,
        included: bool,
    ) -> MockupResult<ComposedMockup> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id)?;
        match channel {
            Channel::Marketplace => row.include_marketplace = included,
            Channel::Storefront => row.include_storefront = included,
        }
        Ok(row.clone())
    }

    async fn set_storefront_primary(&self, id: MockupId) -> MockupResult<ComposedMockup> {
        let mut rows = self.rows.write().await;
        let source_id = rows.get_mut(id)?.source_id;
        for sibling in rows.ids_of(source_id) {
            rows.get_mut(sibling)?.storefront_primary = sibling == id;
        }
        rows.get_mut(id).map(|row| row.clone())
    }

    async fn set_external(&self, id: MockupId, external: Option<ExternalImage>) -> MockupResult<()> {
        self.rows.write().await.get_mut(id)?.external = external;
        Ok(())
    }

    async fn sources_referencing_pack(&self, pack_id: PackId) -> MockupResult<Vec<SourceId>> {
        let rows = self.rows.read().await;
        let mut out: Vec<SourceId> = rows
            .by_id
            .values()
            .filter(|m| m.pack_id == Some(pack_id))
            .map(|m| m.source_id)
            .collect();
        out.sort();
        out.dedup();
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/mockups.rs"]
mod tests;
