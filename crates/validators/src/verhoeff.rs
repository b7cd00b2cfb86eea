//! Verhoeff check digit (dihedral group D5) over decimal identifiers.
//!
//! Detects every single-digit error and every adjacent transposition.
//! Identifiers are written as `UNDECORATED-D`.

use crate::validator::{
    ensure_allowed, normalize, split_hyphenated, IdentifierValidator, ValidatorError,
    ValidatorResult,
};

const ALLOWED: &str = "0123456789";

const MULTIPLICATION: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const PERMUTATION: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

const INVERSE: [u8; 10] = [0, 4, 3, 2, 1, 5, 6, 7, 8, 9];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VerhoeffValidator;

impl VerhoeffValidator {
    pub const KEY: &'static str = "VerhoeffValidator";

    /// Compute the check digit for a string of decimal digits.
    ///
    /// Callers must have rejected non-digit input already.
    pub(crate) fn check_digit(digits: &str) -> u32 {
        let mut c = 0usize;
        for (i, ch) in digits.chars().rev().enumerate() {
            let digit = ch.to_digit(10).unwrap_or(0) as usize;
            let permuted = PERMUTATION[(i + 1) % 8][digit] as usize;
            c = MULTIPLICATION[c][permuted] as usize;
        }
        INVERSE[c] as u32
    }
}

impl IdentifierValidator for VerhoeffValidator {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display_name(&self) -> &'static str {
        "Verhoeff Check Digit Validator"
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

        if check.to_digit(10) != Some(Self::check_digit(undecorated)) {
            return Err(ValidatorError::InvalidCheckDigit(normalized.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn computes_reference_check_digit() {
        assert_eq!(VerhoeffValidator::check_digit("236"), 3);
        assert_eq!(VerhoeffValidator.valid_identifier("236").unwrap(), "236-3");
    }

    #[test]
    fn validates_decorated_identifier() {
        assert!(VerhoeffValidator.is_valid("236-3"));
        assert_eq!(
            VerhoeffValidator.validate("236-4"),
            Err(ValidatorError::InvalidCheckDigit("236-4".to_string()))
        );
    }

    #[test]
    fn rejects_letters() {
        assert!(matches!(
            VerhoeffValidator.valid_identifier("12A"),
            Err(ValidatorError::UnallowedCharacter { character: 'A', .. })
        ));
    }

    proptest! {
        #[test]
        fn generated_identifiers_validate(raw in "[0-9]{1,24}") {
            let decorated = VerhoeffValidator.valid_identifier(&raw).unwrap();
            prop_assert!(VerhoeffValidator.is_valid(&decorated));
        }

        #[test]
        fn single_digit_errors_are_detected(
            raw in "[0-9]{2,16}",
            position in 0usize..16,
            bump in 1u32..10,
        ) {
            let position = position % raw.len();
            let decorated = VerhoeffValidator.valid_identifier(&raw).unwrap();

            let corrupted: String = raw
                .chars()
                .enumerate()
                .map(|(i, ch)| {
                    if i == position {
                        let d = ch.to_digit(10).unwrap();
                        char::from_digit((d + bump) % 10, 10).unwrap()
                    } else {
                        ch
                    }
                })
                .collect();
            let check = decorated.rsplit_once('-').unwrap().1;

            let candidate = format!("{corrupted}-{check}");
            prop_assert!(!VerhoeffValidator.is_valid(&candidate));
        }

        #[test]
        fn adjacent_transpositions_are_detected(raw in "[0-9]{2,16}", position in 0usize..15) {
            let position = position % (raw.len() - 1);
            let mut digits: Vec<char> = raw.chars().collect();
            prop_assume!(digits[position] != digits[position + 1]);

            let check = VerhoeffValidator::check_digit(&raw);
            digits.swap(position, position + 1);
            let swapped: String = digits.into_iter().collect();

            let candidate = format!("{swapped}-{check}");
            prop_assert!(!VerhoeffValidator.is_valid(&candidate));
        }
    }
}
