//! Demo identifier types for development and tests.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use medreg_core::{DomainError, Field, Resource, ResourceUuid};
use medreg_identifiers::{IdentifierType, IdentifierTypePatch};
use medreg_validators::luhn::LuhnValidator;

use crate::entity_store::{EntityStore, EntityStoreError, InMemoryEntityStore};

pub const OPENMRS_ID_UUID: Uuid = Uuid::from_u128(0x1a339fe9_38bc_4ab3_b180_320988c0b968);
pub const OLD_ID_UUID: Uuid = Uuid::from_u128(0x2f470aa8_1d73_43b7_81b5_01f0c0dfa53c);
pub const SSN_UUID: Uuid = Uuid::from_u128(0xc5576187_9a67_43a7_9b7c_04db22851211);
pub const OLD_CLINIC_UUID: Uuid = Uuid::from_u128(0x7f1f1b36_63bd_4b3e_a8d6_3e5b0c3b86a2);

/// Build the demo set: three active types and one retired one.
pub fn demo_identifier_types() -> Result<Vec<IdentifierType>, DomainError> {
    let now = Utc::now();

    let openmrs_id = IdentifierType::create(
        ResourceUuid::from_uuid(OPENMRS_ID_UUID),
        IdentifierTypePatch {
            description: Field::Value("Unique number used in OpenMRS".to_string()),
            required: Field::Value(true),
            check_digit: Field::Value(true),
            validator: Field::Value(LuhnValidator::KEY.to_string()),
            ..IdentifierTypePatch::named("OpenMRS Identification Number")
        },
        now,
    )?;

    let old_id = IdentifierType::create(
        ResourceUuid::from_uuid(OLD_ID_UUID),
        IdentifierTypePatch {
            description: Field::Value("Number given out prior to the OpenMRS system".to_string()),
            ..IdentifierTypePatch::named("Old Identification Number")
        },
        now,
    )?;

    let ssn = IdentifierType::create(
        ResourceUuid::from_uuid(SSN_UUID),
        IdentifierTypePatch {
            description: Field::Value("Government issued social security number".to_string()),
            format: Field::Value(r"\d{3}-\d{2}-\d{4}".to_string()),
            format_description: Field::Value("NNN-NN-NNNN".to_string()),
            ..IdentifierTypePatch::named("Social Security Number")
        },
        now,
    )?;

    let mut old_clinic = IdentifierType::create(
        ResourceUuid::from_uuid(OLD_CLINIC_UUID),
        IdentifierTypePatch {
            description: Field::Value("Paper chart number from the old clinic".to_string()),
            ..IdentifierTypePatch::named("Old Clinic Number")
        },
        now,
    )?;
    old_clinic.retire("superseded", now)?;

    Ok(vec![openmrs_id, old_id, ssn, old_clinic])
}

/// Insert the demo set into `store`. Returns how many entities were written.
pub async fn seed_identifier_types<S>(store: &S) -> Result<usize, EntityStoreError>
where
    S: EntityStore<IdentifierType> + ?Sized,
{
    let entities = demo_identifier_types()
        .map_err(|e| EntityStoreError::Backend(format!("invalid seed data: {e}")))?;
    let total = entities.len();
    for entity in entities {
        store.insert(entity).await?;
    }
    info!(count = total, "seeded identifier types");
    Ok(total)
}

/// Record demo patient identifiers that use the OpenMRS ID type.
pub fn seed_demo_references(
    store: &InMemoryEntityStore<IdentifierType>,
) -> Result<(), EntityStoreError> {
    let openmrs_id = ResourceUuid::from_uuid(OPENMRS_ID_UUID);
    for identifier in ["100-8", "1234-4"] {
        store.add_reference(openmrs_id, format!("patient_identifier {identifier}"))?;
    }
    Ok(())
}
