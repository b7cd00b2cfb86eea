use std::collections::HashMap;
use std::sync::RwLock;

use medreg_core::{Resource, ResourceUuid};

use super::r#trait::{EntityStore, EntityStoreError};

/// In-memory entity store.
///
/// Intended for tests/dev. References recorded with [`add_reference`] stand in
/// for rows elsewhere that point at an entity; a referenced entity cannot be
/// deleted.
///
/// [`add_reference`]: InMemoryEntityStore::add_reference
#[derive(Debug)]
pub struct InMemoryEntityStore<R> {
    entities: RwLock<HashMap<ResourceUuid, R>>,
    references: RwLock<HashMap<ResourceUuid, Vec<String>>>,
}

impl<R> InMemoryEntityStore<R> {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            references: RwLock::new(HashMap::new()),
        }
    }

    /// Record that `referrer` depends on the entity `uuid`.
    pub fn add_reference(
        &self,
        uuid: ResourceUuid,
        referrer: impl Into<String>,
    ) -> Result<(), EntityStoreError> {
        let mut refs = self.references.write().map_err(|_| poisoned())?;
        refs.entry(uuid).or_default().push(referrer.into());
        Ok(())
    }

    /// Drop every reference to `uuid`.
    pub fn clear_references(&self, uuid: ResourceUuid) -> Result<(), EntityStoreError> {
        let mut refs = self.references.write().map_err(|_| poisoned())?;
        refs.remove(&uuid);
        Ok(())
    }

    pub fn references_to(&self, uuid: ResourceUuid) -> Vec<String> {
        match self.references.read() {
            Ok(refs) => refs.get(&uuid).cloned().unwrap_or_default(),
            Err(_) => vec![],
        }
    }
}

impl<R> Default for InMemoryEntityStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> EntityStoreError {
    EntityStoreError::Backend("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl<R: Resource> EntityStore<R> for InMemoryEntityStore<R> {
    async fn get(&self, uuid: ResourceUuid) -> Result<Option<R>, EntityStoreError> {
        let map = self.entities.read().map_err(|_| poisoned())?;
        Ok(map.get(&uuid).cloned())
    }

    async fn list(&self, include_retired: bool) -> Result<Vec<R>, EntityStoreError> {
        let map = self.entities.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|e| include_retired || !e.is_retired())
            .cloned()
            .collect())
    }

    async fn insert(&self, entity: R) -> Result<(), EntityStoreError> {
        let mut map = self.entities.write().map_err(|_| poisoned())?;
        let uuid = *entity.id();
        if map.contains_key(&uuid) {
            return Err(EntityStoreError::Duplicate(uuid));
        }
        map.insert(uuid, entity);
        Ok(())
    }

    async fn update(&self, entity: R) -> Result<(), EntityStoreError> {
        let mut map = self.entities.write().map_err(|_| poisoned())?;
        let uuid = *entity.id();
        match map.get_mut(&uuid) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(EntityStoreError::Missing(uuid)),
        }
    }

    async fn delete(&self, uuid: ResourceUuid) -> Result<(), EntityStoreError> {
        // Lock order: entities, then references.
        let mut map = self.entities.write().map_err(|_| poisoned())?;
        if !map.contains_key(&uuid) {
            return Err(EntityStoreError::Missing(uuid));
        }

        let refs = self.references.read().map_err(|_| poisoned())?;
        if let Some(referrers) = refs.get(&uuid).filter(|r| !r.is_empty()) {
            return Err(EntityStoreError::Constraint(format!(
                "{} {uuid} is referenced by {} record(s)",
                R::RESOURCE_NAME,
                referrers.len()
            )));
        }

        map.remove(&uuid);
        Ok(())
    }

    async fn count(&self) -> Result<u64, EntityStoreError> {
        let map = self.entities.read().map_err(|_| poisoned())?;
        Ok(map.len() as u64)
    }
}
