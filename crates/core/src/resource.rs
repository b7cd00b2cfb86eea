//! Resource contract: what the lifecycle engine needs from a managed entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medreg_validators::ValidatorRegistry;

use crate::audit::AuditInfo;
use crate::entity::Entity;
use crate::error::DomainResult;
use crate::id::ResourceUuid;
use crate::patch::PatchPayload;

/// A UUID-identified, retireable domain object managed through create /
/// update / retire / purge.
///
/// Implementations stay pure: no IO, no clocks. Timestamps are passed in.
pub trait Resource: Entity<Id = ResourceUuid> + Clone + Send + Sync + 'static {
    /// Partial-update payload.
    type Patch: PatchPayload;

    /// Caller-facing view. Must not carry audit metadata.
    type Representation: ResourceRepresentation;

    /// Stable name used in errors and logs (e.g. `"patientidentifiertype"`).
    const RESOURCE_NAME: &'static str;

    /// Build a new, non-retired instance from a patch.
    fn create(uuid: ResourceUuid, patch: Self::Patch, at: DateTime<Utc>) -> DomainResult<Self>;

    /// Overwrite every property present in `patch`; leave the rest alone.
    ///
    /// Never touches the uuid or the retired state.
    fn apply_patch(&mut self, patch: Self::Patch) -> DomainResult<()>;

    /// Cross-field checks, consulting validators where the resource names one.
    fn validate(&self, validators: &ValidatorRegistry) -> DomainResult<()>;

    fn is_retired(&self) -> bool;

    /// Mark retired with `reason`. Re-applies the reason when already retired.
    fn retire(&mut self, reason: &str, at: DateTime<Utc>) -> DomainResult<()>;

    fn audit_info(&self) -> &AuditInfo;

    fn audit_info_mut(&mut self) -> &mut AuditInfo;

    fn to_representation(&self) -> Self::Representation;
}

/// A caller-facing view of a resource.
pub trait ResourceRepresentation: Serialize + Clone + Send + Sync + 'static {
    fn uuid(&self) -> ResourceUuid;

    /// Short human label (usually the name).
    fn display(&self) -> &str;

    fn to_ref(&self) -> ResourceRef {
        ResourceRef {
            uuid: self.uuid(),
            display: self.display().to_string(),
        }
    }
}

/// Minimal reference view: uuid + display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub uuid: ResourceUuid,
    pub display: String,
}
