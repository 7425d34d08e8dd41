//! # RUT Module
//!
//! Chilean national identifier (Rol Único Tributario) used as the person id.
//! Accepted inputs: `12.345.678-5`, `12345678-5`, `123456785`, lowercase `k`.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validated RUT, kept as body number plus check digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rut {
    body: u32,
    check: char,
}

impl Rut {
    /// Parse and validate a RUT string
    pub fn parse(input: &str) -> CoreResult<Self> {
        let cleaned: String = input
            .trim()
            .chars()
            .filter(|c| *c != '.' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if cleaned.len() < 2 {
            return Err(CoreError::InvalidRut(input.to_string()));
        }

        let (body_str, check_str) = cleaned.split_at(cleaned.len() - 1);
        if !body_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidRut(input.to_string()));
        }

        let body: u32 = body_str
            .parse()
            .map_err(|_| CoreError::InvalidRut(input.to_string()))?;
        let check = check_str
            .chars()
            .next()
            .ok_or_else(|| CoreError::InvalidRut(input.to_string()))?;

        if body == 0 || Self::check_digit(body) != check {
            return Err(CoreError::InvalidRut(input.to_string()));
        }

        Ok(Self { body, check })
    }

    /// Modulo-11 check digit for a body number
    pub fn check_digit(body: u32) -> char {
        let mut sum = 0u32;
        let mut factor = 2u32;
        let mut rest = body;

        while rest > 0 {
            sum += (rest % 10) * factor;
            rest /= 10;
            factor = if factor == 7 { 2 } else { factor + 1 };
        }

        match 11 - (sum % 11) {
            11 => '0',
            10 => 'K',
            d => char::from_digit(d, 10).unwrap_or('0'),
        }
    }

    pub fn body(&self) -> u32 {
        self.body
    }

    pub fn check(&self) -> char {
        self.check
    }

    /// Dotted form, e.g. `12.345.678-5`
    pub fn formatted(&self) -> String {
        let digits = self.body.to_string();
        let mut grouped = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        format!("{}-{}", grouped, self.check)
    }
}

impl fmt::Display for Rut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.body, self.check)
    }
}

impl FromStr for Rut {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Rut {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rut> for String {
    fn from(rut: Rut) -> Self {
        rut.to_string()
    }
}
