use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical on-disk and user-facing date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Latest date `parse_expiry_date` can produce. Later dates render with a
/// `+` year prefix, which sorts before every stored date on SQLite.
pub fn latest_storable_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
}

/// A medicine that has passed input validation and may be inserted.
///
/// The fields are private so the only way to obtain one is through
/// [`NewMedicine::new`] (or deserialization, which routes through it).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "RawMedicine")]
pub struct NewMedicine {
    name: String,
    quantity: i32,
    expiry_date: NaiveDate,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Medicine name cannot be empty")]
    EmptyName,
    #[error("Quantity must be a whole number, got '{0}'")]
    InvalidQuantity(String),
    #[error("Quantity cannot be negative, got {0}")]
    NegativeQuantity(i64),
    #[error("Expiry date must be in YYYY-MM-DD format, got '{0}'")]
    InvalidDate(String),
}

impl NewMedicine {
    pub fn new(
        name: &str,
        quantity: i32,
        expiry_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let name = parse_name(name)?;
        if quantity < 0 {
            return Err(ValidationError::NegativeQuantity(quantity.into()));
        }

        Ok(Self {
            name,
            quantity,
            expiry_date,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }
}

#[derive(Deserialize)]
struct RawMedicine {
    name: String,
    quantity: i32,
    expiry_date: String,
}

impl TryFrom<RawMedicine> for NewMedicine {
    type Error = ValidationError;

    fn try_from(raw: RawMedicine) -> Result<Self, Self::Error> {
        let expiry_date = parse_expiry_date(&raw.expiry_date)?;
        NewMedicine::new(&raw.name, raw.quantity, expiry_date)
    }
}

/// Trims the name and rejects it when nothing is left.
pub fn parse_name(input: &str) -> Result<String, ValidationError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

/// Parses a non-negative stock quantity.
pub fn parse_quantity(input: &str) -> Result<i32, ValidationError> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidQuantity(trimmed.to_string()))?;

    if value < 0 {
        return Err(ValidationError::NegativeQuantity(value));
    }

    i32::try_from(value).map_err(|_| ValidationError::InvalidQuantity(trimmed.to_string()))
}

/// Parses a strict, zero-padded `YYYY-MM-DD` calendar date.
///
/// chrono alone accepts unpadded fields such as `2024-6-1`, so the shape is
/// checked before the value.
pub fn parse_expiry_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    let well_formed = trimmed.len() == 10
        && trimmed.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });

    if !well_formed {
        return Err(ValidationError::InvalidDate(trimmed.to_string()));
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}
