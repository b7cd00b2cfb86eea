use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use medreg_core::Resource;
use medreg_identifiers::IdentifierType;
use medreg_infra::{
    seed, EntityStore, EntityStoreError, InMemoryEntityStore, PostgresIdentifierTypeStore,
    ResourceLifecycle,
};
use medreg_validators::ValidatorRegistry;

use crate::config::AppConfig;

/// Store handle for one resource type, erased over the backend.
pub type DynEntityStore<R> = Arc<dyn EntityStore<R>>;

/// Lifecycle engine over an erased store.
pub type Lifecycle<R> = ResourceLifecycle<R, DynEntityStore<R>>;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("DATABASE_URL is required for persistent stores")]
    MissingDatabaseUrl,

    #[error("failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("store setup failed: {0}")]
    Store(#[from] EntityStoreError),
}

/// Gives route handlers the lifecycle engine for resource `R`.
pub trait ResourceServices<R: Resource>: Send + Sync + 'static {
    fn lifecycle(&self) -> &Lifecycle<R>;
}

#[derive(Clone)]
pub struct AppServices {
    identifier_types: Arc<Lifecycle<IdentifierType>>,
}

impl AppServices {
    pub fn new(
        identifier_types: DynEntityStore<IdentifierType>,
        validators: Arc<ValidatorRegistry>,
    ) -> Self {
        Self {
            identifier_types: Arc::new(ResourceLifecycle::new(identifier_types, validators)),
        }
    }

    pub fn identifier_types(&self) -> &Lifecycle<IdentifierType> {
        &self.identifier_types
    }
}

impl ResourceServices<IdentifierType> for AppServices {
    fn lifecycle(&self) -> &Lifecycle<IdentifierType> {
        &self.identifier_types
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, ServicesError> {
    let validators = Arc::new(ValidatorRegistry::with_defaults());

    if config.use_persistent_stores {
        let url = config
            .database_url
            .as_deref()
            .ok_or(ServicesError::MissingDatabaseUrl)?;
        return build_persistent_services(url, validators).await;
    }

    build_in_memory_services(config.seed_demo_data, validators).await
}

async fn build_in_memory_services(
    seed_demo_data: bool,
    validators: Arc<ValidatorRegistry>,
) -> Result<AppServices, ServicesError> {
    let store: Arc<InMemoryEntityStore<IdentifierType>> = Arc::new(InMemoryEntityStore::new());

    if seed_demo_data {
        seed::seed_identifier_types(&*store).await?;
        seed::seed_demo_references(&store)?;
    }

    tracing::info!(seeded = seed_demo_data, "using in-memory stores");
    Ok(AppServices::new(store, validators))
}

async fn build_persistent_services(
    database_url: &str,
    validators: Arc<ValidatorRegistry>,
) -> Result<AppServices, ServicesError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    let store = PostgresIdentifierTypeStore::new(pool);
    store.ensure_schema().await?;

    tracing::info!("using postgres stores");
    Ok(AppServices::new(Arc::new(store), validators))
}
