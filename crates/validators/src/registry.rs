//! Key → validator lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::luhn::LuhnValidator;
use crate::luhn_mod_n::LuhnModNValidator;
use crate::validator::{IdentifierValidator, ValidatorError, ValidatorResult};
use crate::verhoeff::VerhoeffValidator;

/// OpenMRS class names accepted in place of the built-in keys.
pub const OPENMRS_ALIASES: &[(&str, &str)] = &[
    ("org.openmrs.patient.impl.LuhnIdentifierValidator", LuhnValidator::KEY),
    ("org.openmrs.patient.impl.VerhoeffIdentifierValidator", VerhoeffValidator::KEY),
    (
        "org.openmrs.module.idgen.validator.LuhnMod30IdentifierValidator",
        LuhnModNValidator::MOD_30_KEY,
    ),
];

/// Registry of validators addressed by their key or an alias of it.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn IdentifierValidator>>,
    aliases: HashMap<String, String>,
}

impl ValidatorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in algorithm.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LuhnValidator));
        registry.register(Arc::new(VerhoeffValidator));
        registry.register(Arc::new(LuhnModNValidator::mod_30()));
        for (alias, key) in OPENMRS_ALIASES {
            registry.aliases.insert((*alias).to_string(), (*key).to_string());
        }
        registry
    }

    /// Register a validator under its own key, returning any validator it replaced.
    pub fn register(
        &mut self,
        validator: Arc<dyn IdentifierValidator>,
    ) -> Option<Arc<dyn IdentifierValidator>> {
        let key = validator.key().to_string();
        tracing::debug!(validator = %key, "registering identifier validator");
        self.validators.insert(key, validator)
    }

    /// Make `alias` resolve to the validator registered under `key`.
    pub fn register_alias(&mut self, alias: impl Into<String>, key: &str) -> ValidatorResult<()> {
        if !self.validators.contains_key(key) {
            return Err(ValidatorError::UnknownValidator(key.to_string()));
        }
        self.aliases.insert(alias.into(), key.to_string());
        Ok(())
    }

    /// Look up a validator by key, falling back to aliases.
    pub fn resolve(&self, key: &str) -> ValidatorResult<Arc<dyn IdentifierValidator>> {
        let canonical = self.aliases.get(key).map(String::as_str).unwrap_or(key);
        self.validators
            .get(canonical)
            .cloned()
            .ok_or_else(|| ValidatorError::UnknownValidator(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resolve(key).is_ok()
    }

    /// Registered keys, sorted. Aliases are not listed.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_builtin_algorithms() {
        let registry = ValidatorRegistry::with_defaults();
        assert_eq!(
            registry.keys(),
            vec!["LuhnMod30Validator", "LuhnValidator", "VerhoeffValidator"]
        );
    }

    #[test]
    fn resolve_returns_registered_validator() {
        let registry = ValidatorRegistry::with_defaults();
        let v = registry.resolve("VerhoeffValidator").unwrap();
        assert_eq!(v.key(), "VerhoeffValidator");
        assert!(v.is_valid("236-3"));
    }

    #[test]
    fn resolve_unknown_key_is_typed_failure() {
        let registry = ValidatorRegistry::with_defaults();
        let err = registry.resolve("org.example.NoSuchValidator").unwrap_err();
        assert_eq!(
            err,
            ValidatorError::UnknownValidator("org.example.NoSuchValidator".to_string())
        );
    }

    #[test]
    fn openmrs_class_names_resolve_to_builtin_validators() {
        let registry = ValidatorRegistry::with_defaults();
        for (alias, key) in OPENMRS_ALIASES {
            assert_eq!(registry.resolve(alias).unwrap().key(), *key);
        }
        assert!(
            registry
                .resolve("org.openmrs.patient.impl.VerhoeffIdentifierValidator")
                .unwrap()
                .is_valid("236-3")
        );
    }

    #[test]
    fn alias_must_point_at_registered_key() {
        let mut registry = ValidatorRegistry::new();
        assert_eq!(
            registry.register_alias("org.example.Luhn", LuhnValidator::KEY),
            Err(ValidatorError::UnknownValidator("LuhnValidator".to_string()))
        );

        registry.register(Arc::new(LuhnValidator));
        registry.register_alias("org.example.Luhn", LuhnValidator::KEY).unwrap();
        assert!(registry.contains("org.example.Luhn"));
        assert_eq!(registry.keys(), vec!["LuhnValidator"]);
    }

    #[test]
    fn register_replaces_existing_key() {
        let mut registry = ValidatorRegistry::new();
        assert!(registry.register(Arc::new(LuhnValidator)).is_none());
        assert!(registry.register(Arc::new(LuhnValidator)).is_some());
        assert!(registry.contains("LuhnValidator"));
    }
}
