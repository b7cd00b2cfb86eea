//! Resource lifecycle engine.
//!
//! Generic create / retrieve / update / retire / purge / list over any
//! [`Resource`], backed by an injected [`EntityStore`] and [`ValidatorRegistry`].
//!
//! ## Operation Flow
//!
//! ```text
//! Create(patch)        → build entity → validate → insert
//! Update(uuid, patch)  → load → merge patch → validate → update
//! Retire(uuid, reason) → load → retire → update
//! Purge(uuid)          → load → delete (constraint failure → PurgeNotAllowed)
//! ```
//!
//! Nothing is cached between calls: every operation reads through the store and
//! writes back only after all checks passed, so a failed call leaves stored
//! state untouched.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use medreg_core::{DomainError, DomainResult, Resource, ResourceRepresentation, ResourceUuid};
use medreg_validators::ValidatorRegistry;

use crate::entity_store::{EntityStore, EntityStoreError};

pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// No entity exists for the uuid.
    #[error("{resource} not found: {uuid}")]
    NotFound { resource: &'static str, uuid: String },

    /// The payload failed required-field or cross-field checks.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Physical deletion was refused; the entity is unchanged.
    #[error("purge not allowed: {0}")]
    PurgeNotAllowed(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The store failed for a reason unrelated to the request.
    #[error("store failure: {0}")]
    Store(EntityStoreError),
}

impl LifecycleError {
    pub fn not_found<R: Resource>(uuid: ResourceUuid) -> Self {
        Self::NotFound {
            resource: R::RESOURCE_NAME,
            uuid: uuid.to_string(),
        }
    }

    /// Not-found for a caller-supplied id that does not even parse.
    pub fn not_found_raw<R: Resource>(raw: impl Into<String>) -> Self {
        Self::NotFound {
            resource: R::RESOURCE_NAME,
            uuid: raw.into(),
        }
    }
}

impl From<DomainError> for LifecycleError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => LifecycleError::Validation(msg),
            DomainError::InvalidId(msg) => LifecycleError::Validation(msg),
            DomainError::InvariantViolation(msg) => LifecycleError::InvariantViolation(msg),
        }
    }
}

/// Listing options. The default view hides retired entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub include_retired: bool,
}

impl ListOptions {
    pub fn including_retired() -> Self {
        Self {
            include_retired: true,
        }
    }
}

/// Lifecycle engine for one resource type.
///
/// Collaborators are supplied at construction; the engine holds no other state.
pub struct ResourceLifecycle<R, S> {
    store: S,
    validators: Arc<ValidatorRegistry>,
    _resource: PhantomData<fn() -> R>,
}

impl<R, S> ResourceLifecycle<R, S>
where
    R: Resource,
    S: EntityStore<R>,
{
    pub fn new(store: S, validators: Arc<ValidatorRegistry>) -> Self {
        Self {
            store,
            validators,
            _resource: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load(&self, uuid: ResourceUuid) -> LifecycleResult<R> {
        self.store
            .get(uuid)
            .await
            .map_err(|e| self.store_error(e))?
            .ok_or_else(|| LifecycleError::not_found::<R>(uuid))
    }

    fn store_error(&self, err: EntityStoreError) -> LifecycleError {
        match err {
            EntityStoreError::Missing(uuid) => LifecycleError::not_found::<R>(uuid),
            other => LifecycleError::Store(other),
        }
    }

    #[instrument(skip(self), fields(resource = R::RESOURCE_NAME, uuid = %uuid), err)]
    pub async fn retrieve(&self, uuid: ResourceUuid) -> LifecycleResult<R::Representation> {
        let entity = self.load(uuid).await?;
        Ok(entity.to_representation())
    }

    /// Every non-retired entity, ordered by display label then uuid.
    pub async fn list_all(&self) -> LifecycleResult<Vec<R::Representation>> {
        self.list(ListOptions::default()).await
    }

    #[instrument(skip(self), fields(resource = R::RESOURCE_NAME), err)]
    pub async fn list(&self, options: ListOptions) -> LifecycleResult<Vec<R::Representation>> {
        let entities = self
            .store
            .list(options.include_retired)
            .await
            .map_err(|e| self.store_error(e))?;

        let mut representations: Vec<R::Representation> = entities
            .iter()
            .filter(|e| options.include_retired || !e.is_retired())
            .map(Resource::to_representation)
            .collect();
        representations.sort_by(|a, b| {
            a.display()
                .cmp(b.display())
                .then_with(|| a.uuid().cmp(&b.uuid()))
        });
        Ok(representations)
    }

    #[instrument(skip_all, fields(resource = R::RESOURCE_NAME), err)]
    pub async fn create(&self, patch: R::Patch) -> LifecycleResult<R::Representation> {
        let entity = R::create(ResourceUuid::new(), patch, Utc::now())?;
        if let Err(err) = entity.validate(&self.validators) {
            warn!(error = %err, "rejected create payload");
            return Err(err.into());
        }

        let representation = entity.to_representation();
        self.store
            .insert(entity)
            .await
            .map_err(|e| self.store_error(e))?;

        info!(uuid = %representation.uuid(), "created");
        Ok(representation)
    }

    /// Merge `patch` into the stored entity. The uuid and retired state never change here.
    #[instrument(skip(self, patch), fields(resource = R::RESOURCE_NAME, uuid = %uuid), err)]
    pub async fn update(
        &self,
        uuid: ResourceUuid,
        patch: R::Patch,
    ) -> LifecycleResult<R::Representation> {
        let mut entity = self.load(uuid).await?;
        entity.apply_patch(patch)?;
        if let Err(err) = entity.validate(&self.validators) {
            warn!(error = %err, "rejected update payload");
            return Err(err.into());
        }
        entity.audit_info_mut().mark_changed(Utc::now());

        let representation = entity.to_representation();
        self.store
            .update(entity)
            .await
            .map_err(|e| self.store_error(e))?;

        info!("updated");
        Ok(representation)
    }

    #[instrument(skip(self), fields(resource = R::RESOURCE_NAME, uuid = %uuid), err)]
    pub async fn retire(&self, uuid: ResourceUuid, reason: &str) -> LifecycleResult<()> {
        let mut entity = self.load(uuid).await?;
        let already_retired = entity.is_retired();
        entity.retire(reason, Utc::now())?;

        self.store
            .update(entity)
            .await
            .map_err(|e| self.store_error(e))?;

        info!(reason, already_retired, "retired");
        Ok(())
    }

    #[instrument(skip(self), fields(resource = R::RESOURCE_NAME, uuid = %uuid), err)]
    pub async fn purge(&self, uuid: ResourceUuid) -> LifecycleResult<()> {
        self.load(uuid).await?;

        match self.store.delete(uuid).await {
            Ok(()) => {
                info!("purged");
                Ok(())
            }
            Err(EntityStoreError::Constraint(msg)) => {
                warn!(reason = %msg, "purge refused");
                Err(LifecycleError::PurgeNotAllowed(msg))
            }
            Err(other) => Err(self.store_error(other)),
        }
    }

    /// Run a read-only check against the stored entity.
    pub async fn inspect<T, F>(&self, uuid: ResourceUuid, check: F) -> LifecycleResult<T>
    where
        F: FnOnce(&R, &ValidatorRegistry) -> DomainResult<T> + Send,
    {
        let entity = self.load(uuid).await?;
        Ok(check(&entity, &self.validators)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use medreg_core::Field;
    use medreg_identifiers::{IdentifierType, IdentifierTypePatch};

    use crate::entity_store::InMemoryEntityStore;
    use crate::seed::{self, OPENMRS_ID_UUID};

    type Engine = ResourceLifecycle<IdentifierType, Arc<InMemoryEntityStore<IdentifierType>>>;

    async fn seeded_engine() -> Engine {
        let store = Arc::new(InMemoryEntityStore::new());
        seed::seed_identifier_types(&*store).await.unwrap();
        seed::seed_demo_references(&store).unwrap();
        ResourceLifecycle::new(store, Arc::new(ValidatorRegistry::with_defaults()))
    }

    fn openmrs_id() -> ResourceUuid {
        ResourceUuid::from_uuid(OPENMRS_ID_UUID)
    }

    async fn stored_count(engine: &Engine) -> u64 {
        EntityStore::<IdentifierType>::count(engine.store()).await.unwrap()
    }

    async fn stored(engine: &Engine, uuid: ResourceUuid) -> Option<IdentifierType> {
        EntityStore::<IdentifierType>::get(engine.store(), uuid).await.unwrap()
    }

    #[tokio::test]
    async fn retrieve_returns_public_fields() {
        let engine = seeded_engine().await;

        let rep = engine.retrieve(openmrs_id()).await.unwrap();
        assert_eq!(rep.name, "OpenMRS Identification Number");
        assert!(rep.check_digit);
        assert_eq!(rep.validator.as_deref(), Some("LuhnValidator"));
        assert!(!rep.retired);

        let json = serde_json::to_value(&rep).unwrap();
        assert!(json.get("auditInfo").is_none());
    }

    #[tokio::test]
    async fn list_all_hides_retired() {
        let engine = seeded_engine().await;

        let active = engine.list_all().await.unwrap();
        assert_eq!(active.len(), 3);
        assert!(active.iter().all(|r| !r.retired));

        let all = engine.list(ListOptions::including_retired()).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let engine = seeded_engine().await;

        let names: Vec<String> = engine
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn create_adds_one_entity() {
        let engine = seeded_engine().await;
        let before = stored_count(&engine).await;

        let patch = IdentifierTypePatch {
            required: Field::Value(true),
            check_digit: Field::Value(true),
            validator: Field::Value("VerhoeffValidator".to_string()),
            ..IdentifierTypePatch::named("My Type")
        };
        let created = engine.create(patch).await.unwrap();

        assert_eq!(stored_count(&engine).await, before + 1);
        assert_eq!(created.name, "My Type");
        assert!(created.required);
        assert!(!created.retired);
        assert_eq!(created.retire_reason, None);

        let fetched = engine.retrieve(created.uuid).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_with_unknown_validator_is_rejected() {
        let engine = seeded_engine().await;
        let before = stored_count(&engine).await;

        let patch = IdentifierTypePatch {
            check_digit: Field::Value(true),
            validator: Field::Value("org.example.NoSuchValidator".to_string()),
            ..IdentifierTypePatch::named("Broken")
        };
        let err = engine.create(patch).await.unwrap_err();

        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(stored_count(&engine).await, before);
    }

    #[tokio::test]
    async fn create_without_name_is_rejected() {
        let engine = seeded_engine().await;

        let err = engine.create(IdentifierTypePatch::default()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }

    #[tokio::test]
    async fn update_merges_only_present_fields() {
        let engine = seeded_engine().await;
        let before = engine.retrieve(openmrs_id()).await.unwrap();

        let patch = IdentifierTypePatch {
            description: Field::Value("something new".to_string()),
            ..IdentifierTypePatch::default()
        };
        let updated = engine.update(openmrs_id(), patch).await.unwrap();

        assert_eq!(updated.name, "OpenMRS Identification Number");
        assert_eq!(updated.description.as_deref(), Some("something new"));
        assert_eq!(updated.required, before.required);
        assert_eq!(updated.check_digit, before.check_digit);
        assert_eq!(updated.validator, before.validator);
        assert_eq!(updated.uuid, before.uuid);
    }

    #[tokio::test]
    async fn update_records_change_time() {
        let engine = seeded_engine().await;

        let patch = IdentifierTypePatch {
            description: Field::Value("changed".to_string()),
            ..IdentifierTypePatch::default()
        };
        engine.update(openmrs_id(), patch).await.unwrap();

        let stored = stored(&engine, openmrs_id()).await.unwrap();
        assert!(stored.audit_info().date_changed.is_some());
    }

    #[tokio::test]
    async fn failed_update_leaves_entity_unchanged() {
        let engine = seeded_engine().await;
        let before = engine.retrieve(openmrs_id()).await.unwrap();

        let patch = IdentifierTypePatch {
            description: Field::Value("should not stick".to_string()),
            validator: Field::Null,
            ..IdentifierTypePatch::default()
        };
        let err = engine.update(openmrs_id(), patch).await.unwrap_err();

        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(engine.retrieve(openmrs_id()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn retire_sets_flag_and_reason() {
        let engine = seeded_engine().await;

        engine.retire(openmrs_id(), "unit test").await.unwrap();

        let rep = engine.retrieve(openmrs_id()).await.unwrap();
        assert!(rep.retired);
        assert_eq!(rep.retire_reason.as_deref(), Some("unit test"));
        assert!(stored(&engine, openmrs_id()).await.is_some());
    }

    #[tokio::test]
    async fn retire_twice_reapplies_reason() {
        let engine = seeded_engine().await;

        engine.retire(openmrs_id(), "first").await.unwrap();
        engine.retire(openmrs_id(), "second").await.unwrap();

        let rep = engine.retrieve(openmrs_id()).await.unwrap();
        assert_eq!(rep.retire_reason.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn retired_entity_stays_retired_through_update() {
        let engine = seeded_engine().await;
        engine.retire(openmrs_id(), "x").await.unwrap();

        let patch = IdentifierTypePatch {
            description: Field::Value("edited after retirement".to_string()),
            ..IdentifierTypePatch::default()
        };
        let updated = engine.update(openmrs_id(), patch).await.unwrap();

        assert_eq!(updated.description.as_deref(), Some("edited after retirement"));
        assert!(updated.retired);
        assert_eq!(updated.retire_reason.as_deref(), Some("x"));
        assert_eq!(engine.retrieve(openmrs_id()).await.unwrap(), updated);

        let stored = stored(&engine, openmrs_id()).await.unwrap();
        assert!(stored.audit_info().date_retired.is_some());
        assert!(stored.audit_info().date_changed.is_some());
    }

    #[tokio::test]
    async fn oversized_retire_reason_is_rejected() {
        let engine = seeded_engine().await;

        let err = engine
            .retire(openmrs_id(), &"r".repeat(300))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert!(!engine.retrieve(openmrs_id()).await.unwrap().retired);
    }

    #[tokio::test]
    async fn retire_requires_reason() {
        let engine = seeded_engine().await;

        let err = engine.retire(openmrs_id(), "  ").await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert!(!engine.retrieve(openmrs_id()).await.unwrap().retired);
    }

    #[tokio::test]
    async fn purge_of_referenced_entity_is_refused() {
        let engine = seeded_engine().await;
        let before = stored_count(&engine).await;

        let err = engine.purge(openmrs_id()).await.unwrap_err();

        assert!(matches!(err, LifecycleError::PurgeNotAllowed(_)));
        assert_eq!(stored_count(&engine).await, before);
        assert!(engine.retrieve(openmrs_id()).await.is_ok());
    }

    #[tokio::test]
    async fn purge_removes_unreferenced_entity() {
        let engine = seeded_engine().await;
        let created = engine
            .create(IdentifierTypePatch::named("Disposable"))
            .await
            .unwrap();
        let before = stored_count(&engine).await;

        engine.purge(created.uuid).await.unwrap();

        assert_eq!(stored_count(&engine).await, before - 1);
        let err = engine.retrieve(created.uuid).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound { .. }));
    }

    #[tokio::test]
    async fn purge_ignores_retired_flag() {
        let engine = seeded_engine().await;
        let created = engine
            .create(IdentifierTypePatch::named("Short Lived"))
            .await
            .unwrap();
        engine.retire(created.uuid, "done").await.unwrap();

        engine.purge(created.uuid).await.unwrap();
        assert!(stored(&engine, created.uuid).await.is_none());
    }

    #[tokio::test]
    async fn unknown_uuid_is_not_found_everywhere() {
        let engine = seeded_engine().await;
        let missing = ResourceUuid::new();

        let is_not_found = |err: LifecycleError| {
            matches!(err, LifecycleError::NotFound { resource: "patientidentifiertype", .. })
        };

        assert!(is_not_found(engine.retrieve(missing).await.unwrap_err()));
        assert!(is_not_found(
            engine
                .update(missing, IdentifierTypePatch::named("x"))
                .await
                .unwrap_err()
        ));
        assert!(is_not_found(engine.retire(missing, "gone").await.unwrap_err()));
        assert!(is_not_found(engine.purge(missing).await.unwrap_err()));
    }

    #[tokio::test]
    async fn inspect_checks_identifiers_against_type() {
        let engine = seeded_engine().await;

        let ok = engine
            .inspect(openmrs_id(), |it, validators| it.check_identifier("100-8", validators))
            .await;
        assert!(ok.is_ok());

        let bad = engine
            .inspect(openmrs_id(), |it, validators| it.check_identifier("100-9", validators))
            .await
            .unwrap_err();
        assert!(matches!(bad, LifecycleError::Validation(_)));
    }
}
