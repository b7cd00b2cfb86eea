//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Process-wide unique identifier of a resource.
///
/// Assigned once at creation and never changed afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceUuid(Uuid);

impl ResourceUuid {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ResourceUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ResourceUuid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ResourceUuid {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ResourceUuid> for Uuid {
    fn from(value: ResourceUuid) -> Self {
        value.0
    }
}

impl FromStr for ResourceUuid {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("ResourceUuid: {e}")))?;
        Ok(Self(uuid))
    }
}
