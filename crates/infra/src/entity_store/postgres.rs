//! Postgres-backed entity store for identifier types.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | EntityStoreError | Scenario |
//! |----------------------|------------------|----------|
//! | `23505` (unique violation) | `Duplicate` | insert with a uuid that already exists |
//! | `23503` (foreign key violation) | `Constraint` | delete of a type still referenced |
//! | any other / non-database | `Backend` | connection, pool, decoding failures |
//!
//! ## Thread Safety
//!
//! Uses the SQLx connection pool, which is `Send + Sync`. Each call runs as a
//! single statement, so isolation is whatever the database default provides
//! (read committed on a stock Postgres).

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use medreg_core::ResourceUuid;
use medreg_identifiers::{IdentifierType, IdentifierTypeRecord};

use super::r#trait::{EntityStore, EntityStoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patient_identifier_type (
    uuid                UUID PRIMARY KEY,
    name                VARCHAR(50) NOT NULL,
    description         VARCHAR(255),
    format              VARCHAR(255),
    format_description  VARCHAR(255),
    required            BOOLEAN NOT NULL DEFAULT FALSE,
    check_digit         BOOLEAN NOT NULL DEFAULT FALSE,
    validator           VARCHAR(200),
    retired             BOOLEAN NOT NULL DEFAULT FALSE,
    retire_reason       VARCHAR(255),
    date_created        TIMESTAMPTZ NOT NULL,
    date_changed        TIMESTAMPTZ,
    date_retired        TIMESTAMPTZ,
    CONSTRAINT retired_has_reason CHECK (NOT retired OR retire_reason IS NOT NULL)
);

CREATE TABLE IF NOT EXISTS patient_identifier (
    patient_identifier_id BIGSERIAL PRIMARY KEY,
    identifier            VARCHAR(50) NOT NULL,
    identifier_type       UUID NOT NULL
        REFERENCES patient_identifier_type (uuid) ON DELETE RESTRICT
);
"#;

const SELECT_COLUMNS: &str = r#"
    uuid, name, description, format, format_description, required, check_digit,
    validator, retired, retire_reason, date_created, date_changed, date_retired
"#;

pub struct PostgresIdentifierTypeStore {
    pool: Arc<PgPool>,
}

impl PostgresIdentifierTypeStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the identifier type table (and the table referencing it) if missing.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), EntityStoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

fn record_from_row(row: &PgRow) -> Result<IdentifierTypeRecord, sqlx::Error> {
    Ok(IdentifierTypeRecord {
        uuid: ResourceUuid::from_uuid(row.try_get::<uuid::Uuid, _>("uuid")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        format: row.try_get("format")?,
        format_description: row.try_get("format_description")?,
        required: row.try_get("required")?,
        check_digit: row.try_get("check_digit")?,
        validator: row.try_get("validator")?,
        retired: row.try_get("retired")?,
        retire_reason: row.try_get("retire_reason")?,
        date_created: row.try_get("date_created")?,
        date_changed: row.try_get("date_changed")?,
        date_retired: row.try_get("date_retired")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> EntityStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") => EntityStoreError::Constraint(msg),
                _ => EntityStoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            EntityStoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => EntityStoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[async_trait::async_trait]
impl EntityStore<IdentifierType> for PostgresIdentifierTypeStore {
    #[instrument(skip(self), fields(uuid = %uuid), err)]
    async fn get(&self, uuid: ResourceUuid) -> Result<Option<IdentifierType>, EntityStoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM patient_identifier_type WHERE uuid = $1"
        ))
        .bind(uuid.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        match row {
            Some(row) => {
                let record = record_from_row(&row).map_err(|e| map_sqlx_error("get", e))?;
                Ok(Some(record.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self, include_retired: bool) -> Result<Vec<IdentifierType>, EntityStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM patient_identifier_type \
             WHERE ($1 OR NOT retired) ORDER BY name, uuid"
        ))
        .bind(include_retired)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(|row| {
                record_from_row(row)
                    .map(IdentifierType::from)
                    .map_err(|e| map_sqlx_error("list", e))
            })
            .collect()
    }

    #[instrument(skip(self, entity), fields(uuid = %entity.uuid()), err)]
    async fn insert(&self, entity: IdentifierType) -> Result<(), EntityStoreError> {
        let r = IdentifierTypeRecord::from(&entity);
        let result = sqlx::query(
            r#"
            INSERT INTO patient_identifier_type (
                uuid, name, description, format, format_description, required, check_digit,
                validator, retired, retire_reason, date_created, date_changed, date_retired
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(r.uuid.as_uuid())
        .bind(&r.name)
        .bind(&r.description)
        .bind(&r.format)
        .bind(&r.format_description)
        .bind(r.required)
        .bind(r.check_digit)
        .bind(&r.validator)
        .bind(r.retired)
        .bind(&r.retire_reason)
        .bind(r.date_created)
        .bind(r.date_changed)
        .bind(r.date_retired)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(EntityStoreError::Duplicate(r.uuid)),
            Err(e) => Err(map_sqlx_error("insert", e)),
        }
    }

    #[instrument(skip(self, entity), fields(uuid = %entity.uuid()), err)]
    async fn update(&self, entity: IdentifierType) -> Result<(), EntityStoreError> {
        let r = IdentifierTypeRecord::from(&entity);
        let result = sqlx::query(
            r#"
            UPDATE patient_identifier_type SET
                name = $2,
                description = $3,
                format = $4,
                format_description = $5,
                required = $6,
                check_digit = $7,
                validator = $8,
                retired = $9,
                retire_reason = $10,
                date_changed = $11,
                date_retired = $12
            WHERE uuid = $1
            "#,
        )
        .bind(r.uuid.as_uuid())
        .bind(&r.name)
        .bind(&r.description)
        .bind(&r.format)
        .bind(&r.format_description)
        .bind(r.required)
        .bind(r.check_digit)
        .bind(&r.validator)
        .bind(r.retired)
        .bind(&r.retire_reason)
        .bind(r.date_changed)
        .bind(r.date_retired)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(EntityStoreError::Missing(r.uuid));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(uuid = %uuid), err)]
    async fn delete(&self, uuid: ResourceUuid) -> Result<(), EntityStoreError> {
        let result = sqlx::query("DELETE FROM patient_identifier_type WHERE uuid = $1")
            .bind(uuid.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(EntityStoreError::Missing(uuid));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<u64, EntityStoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM patient_identifier_type")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("count", e))?;
        Ok(total.max(0) as u64)
    }
}
