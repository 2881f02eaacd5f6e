use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::foundation::core::SourceId;

/// One async mutex per artwork, so a delete-then-insert of its mockups never
/// interleaves with another pass over the same artwork.
#[derive(Debug, Default)]
pub struct ArtworkLocks {
    slots: Mutex<HashMap<SourceId, Arc<AsyncMutex<()>>>>,
}

impl ArtworkLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: SourceId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|key, slot| *key == id || Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(id).or_default())
        };
        slot.lock_owned().await
    }
}
