//! Identifier validator contract and shared helpers.

use thiserror::Error;

/// Result type used by identifier validators.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Failure raised while resolving a validator or checking an identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// No validator is registered under the requested key.
    #[error("unknown validator: {0}")]
    UnknownValidator(String),

    /// The identifier was empty after trimming.
    #[error("identifier must not be blank")]
    Blank,

    /// The identifier contains a character outside the validator's alphabet.
    #[error("identifier '{identifier}' contains unallowed character '{character}'")]
    UnallowedCharacter { identifier: String, character: char },

    /// The identifier does not carry a check digit in the expected position.
    #[error("identifier '{0}' has no check digit")]
    MissingCheckDigit(String),

    /// The check digit does not match the one computed for the identifier.
    #[error("invalid check digit for identifier '{0}'")]
    InvalidCheckDigit(String),

    /// A validator was configured with an unusable alphabet.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),
}

/// A named check-digit algorithm.
///
/// Implementations must be pure: the same input always yields the same result
/// and no state is kept between calls.
pub trait IdentifierValidator: Send + Sync + core::fmt::Debug {
    /// Registry key entities use to reference this validator.
    fn key(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str;

    /// Characters accepted in the undecorated part of an identifier.
    fn allowed_characters(&self) -> &'static str;

    /// Append the check digit to an undecorated identifier.
    fn valid_identifier(&self, undecorated: &str) -> ValidatorResult<String>;

    /// Verify a decorated identifier (undecorated part + check digit).
    fn validate(&self, identifier: &str) -> ValidatorResult<()>;

    fn is_valid(&self, identifier: &str) -> bool {
        self.validate(identifier).is_ok()
    }
}

/// Trim + uppercase, rejecting blank input.
pub(crate) fn normalize(identifier: &str) -> ValidatorResult<String> {
    let normalized = identifier.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(ValidatorError::Blank);
    }
    Ok(normalized)
}

/// Reject characters outside `allowed`.
pub(crate) fn ensure_allowed(identifier: &str, allowed: &str) -> ValidatorResult<()> {
    match identifier.chars().find(|c| !allowed.contains(*c)) {
        Some(character) => Err(ValidatorError::UnallowedCharacter {
            identifier: identifier.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

/// Split `UNDECORATED-D` into its two halves.
///
/// The check digit must be exactly one character after the last hyphen.
pub(crate) fn split_hyphenated(identifier: &str) -> ValidatorResult<(&str, char)> {
    let (undecorated, check) = identifier
        .rsplit_once('-')
        .ok_or_else(|| ValidatorError::MissingCheckDigit(identifier.to_string()))?;

    let mut chars = check.chars();
    match (chars.next(), chars.next()) {
        (Some(digit), None) if !undecorated.is_empty() => Ok((undecorated, digit)),
        (None, _) => Err(ValidatorError::MissingCheckDigit(identifier.to_string())),
        _ => Err(ValidatorError::InvalidCheckDigit(identifier.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize("  ab12 ").unwrap(), "AB12");
        assert_eq!(normalize("   "), Err(ValidatorError::Blank));
    }

    #[test]
    fn split_hyphenated_uses_last_hyphen() {
        assert_eq!(split_hyphenated("12-34-5").unwrap(), ("12-34", '5'));
    }

    #[test]
    fn split_hyphenated_rejects_missing_or_long_check_digit() {
        assert!(matches!(
            split_hyphenated("1234"),
            Err(ValidatorError::MissingCheckDigit(_))
        ));
        assert!(matches!(
            split_hyphenated("1234-"),
            Err(ValidatorError::MissingCheckDigit(_))
        ));
        assert!(matches!(
            split_hyphenated("1234-56"),
            Err(ValidatorError::InvalidCheckDigit(_))
        ));
        assert!(matches!(
            split_hyphenated("-5"),
            Err(ValidatorError::InvalidCheckDigit(_))
        ));
    }

    #[test]
    fn ensure_allowed_reports_first_offender() {
        let err = ensure_allowed("12a4", "0123456789").unwrap_err();
        assert_eq!(
            err,
            ValidatorError::UnallowedCharacter {
                identifier: "12a4".to_string(),
                character: 'a'
            }
        );
    }
}
