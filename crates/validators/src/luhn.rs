//! Luhn (mod 10) check digit over an alphanumeric alphabet.
//!
//! Characters are weighted by their ASCII offset from `'0'`, so letters carry
//! values above nine. Identifiers are written as `UNDECORATED-D`.

use crate::validator::{
    ensure_allowed, normalize, split_hyphenated, IdentifierValidator, ValidatorError,
    ValidatorResult,
};

const ALLOWED: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVYWXZ_";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LuhnValidator;

impl LuhnValidator {
    pub const KEY: &'static str = "LuhnValidator";

    /// Compute the check digit for an already-normalized identifier.
    pub fn check_digit(undecorated: &str) -> u32 {
        let mut sum: i64 = 0;
        for (i, ch) in undecorated.chars().rev().enumerate() {
            let digit = ch as i64 - '0' as i64;
            let weight = if i % 2 == 0 {
                2 * digit - (digit / 5) * 9
            } else {
                digit
            };
            sum += weight;
        }
        let sum = sum.abs() + 10;
        ((10 - (sum % 10)) % 10) as u32
    }
}

impl IdentifierValidator for LuhnValidator {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display_name(&self) -> &'static str {
        "Luhn CheckDigit Validator"
    }

    fn allowed_characters(&self) -> &'static str {
        ALLOWED
    }

    fn valid_identifier(&self, undecorated: &str) -> ValidatorResult<String> {
        let undecorated = normalize(undecorated)?;
        ensure_allowed(&undecorated, ALLOWED)?;
        let digit = Self::check_digit(&undecorated);
        Ok(format!("{undecorated}-{digit}"))
    }

    fn validate(&self, identifier: &str) -> ValidatorResult<()> {
        let normalized = normalize(identifier)?;
        let (undecorated, check) = split_hyphenated(&normalized)?;
        ensure_allowed(undecorated, ALLOWED)?;

        let expected = Self::check_digit(undecorated);
        if check.to_digit(10) != Some(expected) {
            return Err(ValidatorError::InvalidCheckDigit(normalized.clone()));
        }
        Ok(())
    }
}
