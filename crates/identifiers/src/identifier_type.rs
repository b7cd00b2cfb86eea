use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use medreg_core::{
    AuditInfo, DomainError, DomainResult, Entity, Field, PatchObject, PatchPayload, Resource,
    ResourceRepresentation, ResourceUuid,
};
use medreg_validators::{IdentifierValidator, ValidatorRegistry};

pub const NAME_MAX_LEN: usize = 50;
pub const DESCRIPTION_MAX_LEN: usize = 255;
pub const FORMAT_MAX_LEN: usize = 255;
pub const FORMAT_DESCRIPTION_MAX_LEN: usize = 255;
pub const RETIRE_REASON_MAX_LEN: usize = 255;

const WRITABLE_PROPERTIES: &[&str] = &[
    "name",
    "description",
    "format",
    "formatDescription",
    "required",
    "checkDigit",
    "validator",
];

/// A kind of patient identifier (e.g. a national id, a local record number).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierType {
    uuid: ResourceUuid,
    name: String,
    description: Option<String>,
    format: Option<String>,
    format_description: Option<String>,
    required: bool,
    check_digit: bool,
    validator: Option<String>,
    retired: bool,
    retire_reason: Option<String>,
    audit: AuditInfo,
}

impl IdentifierType {
    pub fn uuid(&self) -> ResourceUuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn format_description(&self) -> Option<&str> {
        self.format_description.as_deref()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn check_digit(&self) -> bool {
        self.check_digit
    }

    pub fn validator(&self) -> Option<&str> {
        self.validator.as_deref()
    }

    pub fn retired(&self) -> bool {
        self.retired
    }

    pub fn retire_reason(&self) -> Option<&str> {
        self.retire_reason.as_deref()
    }

    /// Check a candidate identifier value against this type's format and
    /// check-digit validator.
    pub fn check_identifier(
        &self,
        identifier: &str,
        validators: &ValidatorRegistry,
    ) -> DomainResult<()> {
        if identifier.trim().is_empty() {
            return Err(DomainError::validation("identifier cannot be blank"));
        }

        if let Some(format) = &self.format {
            let pattern = compile_format(format)?;
            if !pattern.is_match(identifier) {
                let expected = self.format_description.as_deref().unwrap_or(format);
                return Err(DomainError::validation(format!(
                    "identifier '{identifier}' does not match the required format: {expected}"
                )));
            }
        }

        if self.check_digit {
            let key = self
                .validator
                .as_deref()
                .ok_or_else(|| DomainError::invariant("checkDigit is set without a validator"))?;
            validators.resolve(key)?.validate(identifier)?;
        }

        Ok(())
    }
}

/// Compile `format` anchored at both ends.
///
/// The pattern must compile on its own first: wrapping an unbalanced pattern
/// such as `1)|(2` can produce a valid regex whose anchors no longer cover
/// every alternative.
fn compile_format(format: &str) -> DomainResult<Regex> {
    let invalid =
        |e: regex::Error| DomainError::validation(format!("format is not a valid pattern: {e}"));
    Regex::new(format).map_err(invalid)?;
    Regex::new(&format!("^(?:{format})$")).map_err(invalid)
}

fn ensure_max_len(property: &str, value: Option<&str>, max: usize) -> DomainResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(DomainError::validation(format!(
            "{property} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

impl Entity for IdentifierType {
    type Id = ResourceUuid;

    fn id(&self) -> &Self::Id {
        &self.uuid
    }
}

/// Partial update for an [`IdentifierType`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierTypePatch {
    pub name: Field<String>,
    pub description: Field<String>,
    pub format: Field<String>,
    pub format_description: Field<String>,
    pub required: Field<bool>,
    pub check_digit: Field<bool>,
    pub validator: Field<String>,
}

impl IdentifierTypePatch {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Field::Value(name.into()),
            ..Self::default()
        }
    }
}

impl PatchPayload for IdentifierTypePatch {
    fn from_json(object: &Map<String, JsonValue>) -> DomainResult<Self> {
        let patch = PatchObject::new(object);
        patch.reject_unknown(WRITABLE_PROPERTIES)?;

        Ok(Self {
            name: patch.string("name")?,
            description: patch.string("description")?,
            format: patch.string("format")?,
            format_description: patch.string("formatDescription")?,
            required: patch.boolean("required")?,
            check_digit: patch.boolean("checkDigit")?,
            validator: patch.string("validator")?,
        })
    }
}

/// Caller-facing view of an [`IdentifierType`]. Carries no audit metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierTypeRepresentation {
    pub uuid: ResourceUuid,
    pub display: String,
    pub name: String,
    pub description: Option<String>,
    pub format: Option<String>,
    pub format_description: Option<String>,
    pub required: bool,
    pub check_digit: bool,
    pub validator: Option<String>,
    pub retired: bool,
    pub retire_reason: Option<String>,
}

impl ResourceRepresentation for IdentifierTypeRepresentation {
    fn uuid(&self) -> ResourceUuid {
        self.uuid
    }

    fn display(&self) -> &str {
        &self.display
    }
}

/// Flat persisted layout of an [`IdentifierType`], audit data included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierTypeRecord {
    pub uuid: ResourceUuid,
    pub name: String,
    pub description: Option<String>,
    pub format: Option<String>,
    pub format_description: Option<String>,
    pub required: bool,
    pub check_digit: bool,
    pub validator: Option<String>,
    pub retired: bool,
    pub retire_reason: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_changed: Option<DateTime<Utc>>,
    pub date_retired: Option<DateTime<Utc>>,
}

impl From<IdentifierTypeRecord> for IdentifierType {
    fn from(r: IdentifierTypeRecord) -> Self {
        Self {
            uuid: r.uuid,
            name: r.name,
            description: r.description,
            format: r.format,
            format_description: r.format_description,
            required: r.required,
            check_digit: r.check_digit,
            validator: r.validator,
            retired: r.retired,
            retire_reason: r.retire_reason,
            audit: AuditInfo {
                date_created: r.date_created,
                date_changed: r.date_changed,
                date_retired: r.date_retired,
            },
        }
    }
}

impl From<&IdentifierType> for IdentifierTypeRecord {
    fn from(it: &IdentifierType) -> Self {
        Self {
            uuid: it.uuid,
            name: it.name.clone(),
            description: it.description.clone(),
            format: it.format.clone(),
            format_description: it.format_description.clone(),
            required: it.required,
            check_digit: it.check_digit,
            validator: it.validator.clone(),
            retired: it.retired,
            retire_reason: it.retire_reason.clone(),
            date_created: it.audit.date_created,
            date_changed: it.audit.date_changed,
            date_retired: it.audit.date_retired,
        }
    }
}

impl Resource for IdentifierType {
    type Patch = IdentifierTypePatch;
    type Representation = IdentifierTypeRepresentation;

    const RESOURCE_NAME: &'static str = "patientidentifiertype";

    fn create(uuid: ResourceUuid, patch: Self::Patch, at: DateTime<Utc>) -> DomainResult<Self> {
        if patch.name.as_value().is_none() {
            return Err(DomainError::validation("name is required"));
        }

        let mut created = Self {
            uuid,
            name: String::new(),
            description: None,
            format: None,
            format_description: None,
            required: false,
            check_digit: false,
            validator: None,
            retired: false,
            retire_reason: None,
            audit: AuditInfo::created_at(at),
        };
        created.apply_patch(patch)?;
        Ok(created)
    }

    fn apply_patch(&mut self, patch: Self::Patch) -> DomainResult<()> {
        patch.name.merge_required(&mut self.name, "name")?;
        patch.description.merge_into(&mut self.description);
        patch.format.merge_into(&mut self.format);
        patch.format_description.merge_into(&mut self.format_description);
        patch.required.merge_required(&mut self.required, "required")?;
        patch.check_digit.merge_required(&mut self.check_digit, "checkDigit")?;
        patch.validator.merge_into(&mut self.validator);
        Ok(())
    }

    fn validate(&self, validators: &ValidatorRegistry) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_max_len("name", Some(&self.name), NAME_MAX_LEN)?;
        ensure_max_len("description", self.description.as_deref(), DESCRIPTION_MAX_LEN)?;
        ensure_max_len("format", self.format.as_deref(), FORMAT_MAX_LEN)?;
        ensure_max_len(
            "formatDescription",
            self.format_description.as_deref(),
            FORMAT_DESCRIPTION_MAX_LEN,
        )?;

        if let Some(format) = &self.format {
            compile_format(format)?;
        }

        match (self.check_digit, self.validator.as_deref()) {
            (true, None) => Err(DomainError::validation(
                "validator is required when checkDigit is true",
            )),
            (true, Some(key)) => {
                validators.resolve(key)?;
                Ok(())
            }
            (false, Some(_)) => Err(DomainError::validation(
                "validator may only be set when checkDigit is true",
            )),
            (false, None) => Ok(()),
        }
    }

    fn is_retired(&self) -> bool {
        self.retired
    }

    fn retire(&mut self, reason: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("retire reason is required"));
        }
        ensure_max_len("retireReason", Some(reason), RETIRE_REASON_MAX_LEN)?;
        self.retired = true;
        self.retire_reason = Some(reason.to_string());
        self.audit.mark_retired(at);
        Ok(())
    }

    fn audit_info(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }

    fn to_representation(&self) -> Self::Representation {
        IdentifierTypeRepresentation {
            uuid: self.uuid,
            display: self.name.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            format: self.format.clone(),
            format_description: self.format_description.clone(),
            required: self.required,
            check_digit: self.check_digit,
            validator: self.validator.clone(),
            retired: self.retired,
            retire_reason: self.retire_reason.clone(),
        }
    }
}
