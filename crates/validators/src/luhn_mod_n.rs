//! Luhn mod N over a configurable alphabet.
//!
//! The check character is appended directly (no hyphen). The stock
//! configuration uses a 30-character alphabet without easily confused letters.

use std::collections::HashSet;

use crate::validator::{
    ensure_allowed, normalize, IdentifierValidator, ValidatorError, ValidatorResult,
};

pub const MOD_30_ALPHABET: &str = "0123456789ACDEFGHJKLMNPRTUVWXY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LuhnModNValidator {
    key: &'static str,
    display_name: &'static str,
    alphabet: &'static str,
}

impl LuhnModNValidator {
    pub const MOD_30_KEY: &'static str = "LuhnMod30Validator";

    /// Build a validator over `alphabet`; N is the alphabet length.
    ///
    /// The alphabet must be non-empty, uppercase, and free of repeated characters.
    pub fn new(
        key: &'static str,
        display_name: &'static str,
        alphabet: &'static str,
    ) -> ValidatorResult<Self> {
        if alphabet.is_empty() {
            return Err(ValidatorError::InvalidAlphabet("alphabet is empty".to_string()));
        }
        if alphabet != alphabet.to_uppercase() {
            return Err(ValidatorError::InvalidAlphabet(format!(
                "'{alphabet}' contains lowercase characters"
            )));
        }
        let mut seen = HashSet::new();
        if let Some(repeated) = alphabet.chars().find(|c| !seen.insert(*c)) {
            return Err(ValidatorError::InvalidAlphabet(format!(
                "'{alphabet}' repeats '{repeated}'"
            )));
        }

        Ok(Self {
            key,
            display_name,
            alphabet,
        })
    }

    pub const fn mod_30() -> Self {
        Self {
            key: Self::MOD_30_KEY,
            display_name: "Luhn Mod-30 Check-Digit Validator",
            alphabet: MOD_30_ALPHABET,
        }
    }

    /// Position of `ch` in the alphabet. Input has passed `ensure_allowed`.
    fn code_point(&self, ch: char) -> usize {
        self.alphabet.chars().position(|c| c == ch).unwrap_or(0)
    }

    /// Compute the check character for an identifier already checked
    /// against the alphabet.
    pub(crate) fn check_character(&self, undecorated: &str) -> char {
        let n = self.alphabet.chars().count();
        let mut factor = 2;
        let mut sum = 0;

        for ch in undecorated.chars().rev() {
            let mut addend = factor * self.code_point(ch);
            factor = if factor == 2 { 1 } else { 2 };
            addend = addend / n + addend % n;
            sum += addend;
        }

        let check = (n - sum % n) % n;
        self.alphabet.chars().nth(check).unwrap_or('0')
    }
}

impl Default for LuhnModNValidator {
    fn default() -> Self {
        Self::mod_30()
    }
}

impl IdentifierValidator for LuhnModNValidator {
    fn key(&self) -> &'static str {
        self.key
    }

    fn display_name(&self) -> &'static str {
        self.display_name
    }

    fn allowed_characters(&self) -> &'static str {
        self.alphabet
    }

    fn valid_identifier(&self, undecorated: &str) -> ValidatorResult<String> {
        let undecorated = normalize(undecorated)?;
        ensure_allowed(&undecorated, self.alphabet)?;
        let check = self.check_character(&undecorated);
        Ok(format!("{undecorated}{check}"))
    }

    fn validate(&self, identifier: &str) -> ValidatorResult<()> {
        let normalized = normalize(identifier)?;
        ensure_allowed(&normalized, self.alphabet)?;

        let mut chars = normalized.chars();
        let check = chars
            .next_back()
            .ok_or_else(|| ValidatorError::MissingCheckDigit(normalized.clone()))?;
        let undecorated = chars.as_str();
        if undecorated.is_empty() {
            return Err(ValidatorError::MissingCheckDigit(normalized.clone()));
        }

        if self.check_character(undecorated) != check {
            return Err(ValidatorError::InvalidCheckDigit(normalized.clone()));
        }
        Ok(())
    }
}
