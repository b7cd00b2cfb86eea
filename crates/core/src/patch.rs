//! Partial-update payloads.
//!
//! A patch names only the properties a caller wants to touch. Each property is
//! read into a [`Field`], which keeps "not sent" apart from "sent as null".

use serde_json::{Map, Value as JsonValue};

use crate::error::{DomainError, DomainResult};

/// Properties a client may echo back from a representation; never writable.
pub const READ_ONLY_PROPERTIES: &[&str] = &[
    "uuid",
    "display",
    "retired",
    "retireReason",
    "auditInfo",
    "links",
    "resourceVersion",
];

/// Presence-aware value of one patch property.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// Property not present in the payload; leave the target untouched.
    #[default]
    Absent,
    /// Property sent as `null`; clear the target.
    Null,
    /// Property sent with a value.
    Value(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Merge into an optional target.
    pub fn merge_into(self, target: &mut Option<T>) {
        match self {
            Field::Absent => {}
            Field::Null => *target = None,
            Field::Value(v) => *target = Some(v),
        }
    }

    /// Merge into a non-optional target; `null` is rejected.
    pub fn merge_required(self, target: &mut T, property: &str) -> DomainResult<()> {
        match self {
            Field::Absent => Ok(()),
            Field::Null => Err(DomainError::validation(format!("{property} cannot be null"))),
            Field::Value(v) => {
                *target = v;
                Ok(())
            }
        }
    }
}

/// Typed view over a loosely-typed JSON object.
#[derive(Debug, Clone, Copy)]
pub struct PatchObject<'a> {
    object: &'a Map<String, JsonValue>,
}

impl<'a> PatchObject<'a> {
    pub fn new(object: &'a Map<String, JsonValue>) -> Self {
        Self { object }
    }

    /// Fail on any property that is neither writable nor read-only.
    pub fn reject_unknown(&self, writable: &[&str]) -> DomainResult<()> {
        let mut unknown: Vec<&str> = self
            .object
            .keys()
            .map(String::as_str)
            .filter(|k| !writable.contains(k) && !READ_ONLY_PROPERTIES.contains(k))
            .collect();

        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        Err(DomainError::validation(format!(
            "unknown properties: {}",
            unknown.join(", ")
        )))
    }

    pub fn string(&self, property: &str) -> DomainResult<Field<String>> {
        match self.object.get(property) {
            None => Ok(Field::Absent),
            Some(JsonValue::Null) => Ok(Field::Null),
            Some(JsonValue::String(s)) => Ok(Field::Value(s.clone())),
            Some(other) => Err(type_mismatch(property, "a string", other)),
        }
    }

    pub fn boolean(&self, property: &str) -> DomainResult<Field<bool>> {
        match self.object.get(property) {
            None => Ok(Field::Absent),
            Some(JsonValue::Null) => Ok(Field::Null),
            Some(JsonValue::Bool(b)) => Ok(Field::Value(*b)),
            Some(other) => Err(type_mismatch(property, "a boolean", other)),
        }
    }
}

fn type_mismatch(property: &str, expected: &str, found: &JsonValue) -> DomainError {
    let found = match found {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    };
    DomainError::validation(format!("{property} must be {expected}, found {found}"))
}

/// Typed patch built from a JSON object.
pub trait PatchPayload: Sized + Send + 'static {
    fn from_json(object: &Map<String, JsonValue>) -> DomainResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let map = object(json!({ "description": null, "name": "x" }));
        let patch = PatchObject::new(&map);

        assert_eq!(patch.string("format").unwrap(), Field::Absent);
        assert_eq!(patch.string("description").unwrap(), Field::Null);
        assert_eq!(patch.string("name").unwrap(), Field::Value("x".to_string()));
    }

    #[test]
    fn wrong_json_type_is_validation_error() {
        let map = object(json!({ "required": "yes" }));
        let err = PatchObject::new(&map).boolean("required").unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("required must be a boolean, found a string".to_string())
        );
    }

    #[test]
    fn read_only_properties_are_tolerated_but_unknown_are_not() {
        let map = object(json!({ "uuid": "abc", "retired": true, "name": "x" }));
        assert!(PatchObject::new(&map).reject_unknown(&["name"]).is_ok());

        let map = object(json!({ "name": "x", "colour": "red", "bogus": 1 }));
        let err = PatchObject::new(&map).reject_unknown(&["name"]).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("unknown properties: bogus, colour".to_string())
        );
    }

    #[test]
    fn merge_into_respects_presence() {
        let mut target = Some("old".to_string());
        Field::Absent.merge_into(&mut target);
        assert_eq!(target.as_deref(), Some("old"));

        Field::Value("new".to_string()).merge_into(&mut target);
        assert_eq!(target.as_deref(), Some("new"));

        Field::<String>::Null.merge_into(&mut target);
        assert_eq!(target, None);
    }

    #[test]
    fn merge_required_rejects_null() {
        let mut flag = true;
        assert!(Field::<bool>::Null.merge_required(&mut flag, "required").is_err());
        assert!(flag);
        Field::Value(false).merge_required(&mut flag, "required").unwrap();
        assert!(!flag);
    }
}
