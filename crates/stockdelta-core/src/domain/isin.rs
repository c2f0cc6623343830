use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const ISIN_LEN: usize = 12;

/// International Securities Identification Number with a verified check digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isin(String);

impl Isin {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyIsin);
        }

        let len = normalized.chars().count();
        if len != ISIN_LEN {
            return Err(ValidationError::IsinLength { len });
        }

        let bytes = normalized.as_bytes();
        let well_formed = bytes[..2].iter().all(u8::is_ascii_uppercase)
            && bytes[2..11].iter().all(u8::is_ascii_alphanumeric)
            && bytes[11].is_ascii_digit();
        if !well_formed {
            return Err(ValidationError::IsinFormat { value: normalized });
        }

        if !check_digit_matches(bytes) {
            return Err(ValidationError::IsinCheckDigit { value: normalized });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Luhn check over the ISIN with letters expanded to two-digit numbers (A=10 .. Z=35).
fn check_digit_matches(bytes: &[u8]) -> bool {
    let mut digits = Vec::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        if byte.is_ascii_digit() {
            digits.push(u32::from(byte - b'0'));
        } else {
            let value = u32::from(byte - b'A') + 10;
            digits.push(value / 10);
            digits.push(value % 10);
        }
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(position, &digit)| {
            if position % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

impl Display for Isin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Isin {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isin> for String {
    fn from(value: Isin) -> Self {
        value.0
    }
}
