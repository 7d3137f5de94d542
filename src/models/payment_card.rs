use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::DefaultFlag;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CardBrand {
    #[strum(serialize = "VISA")]
    Visa,
    Mastercard,
    RuPay,
    Amex,
    Other,
}

impl CardBrand {
    /// Best-effort brand detection from the leading digits.
    pub fn detect(number: &str) -> Self {
        let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
        let prefix = |n: usize| digits.get(..n).and_then(|p| p.parse::<u32>().ok());

        match (prefix(1), prefix(2), prefix(4)) {
            (Some(4), _, _) => CardBrand::Visa,
            (_, Some(34 | 37), _) => CardBrand::Amex,
            (_, Some(51..=55), _) => CardBrand::Mastercard,
            (_, _, Some(2221..=2720)) => CardBrand::Mastercard,
            (_, Some(60 | 65 | 81 | 82), _) => CardBrand::RuPay,
            _ => CardBrand::Other,
        }
    }
}

/// A saved payment card. Only the last four digits are ever kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCard {
    pub id: CardId,
    pub masked_number: String,
    pub card_holder: String,
    pub expiry: String,
    pub brand: CardBrand,
    pub is_default: bool,
}

impl SavedCard {
    pub(crate) fn from_input(id: CardId, input: NewCard) -> Self {
        let digits: String = input
            .card_number
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let last4 = &digits[digits.len().saturating_sub(4)..];
        let brand = input
            .brand
            .unwrap_or_else(|| CardBrand::detect(&input.card_number));

        Self {
            id,
            masked_number: format!("**** **** **** {}", last4),
            card_holder: input.card_holder,
            expiry: input.expiry,
            brand,
            is_default: input.is_default,
        }
    }

    pub fn last4(&self) -> &str {
        &self.masked_number[self.masked_number.len().saturating_sub(4)..]
    }

    /// Overwrites the editable fields named in `patch`. The number is fixed
    /// once saved and the default flag belongs to the wallet.
    pub(crate) fn apply(&mut self, patch: CardPatch) {
        if let Some(holder) = patch.card_holder {
            self.card_holder = holder;
        }
        if let Some(expiry) = patch.expiry {
            self.expiry = expiry;
        }
    }
}

impl DefaultFlag for SavedCard {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default_flag(&mut self, value: bool) {
        self.is_default = value;
    }
}

/// Input for saving a card
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCard {
    #[validate(custom = "validate_card_number")]
    pub card_number: String,
    #[validate(length(min = 1, message = "Card holder is required"))]
    pub card_holder: String,
    #[validate(custom = "validate_expiry")]
    pub expiry: String,
    #[serde(default)]
    pub brand: Option<CardBrand>,
    #[serde(default)]
    pub is_default: bool,
}

/// Edit of a saved card. `None` leaves a field as it is.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CardPatch {
    #[validate(length(min = 1, message = "Card holder is required"))]
    pub card_holder: Option<String>,
    #[validate(custom = "validate_expiry")]
    pub expiry: Option<String>,
    pub is_default: Option<bool>,
}

fn validate_card_number(value: &str) -> Result<(), ValidationError> {
    let digits: String = value.chars().filter(|c| *c != ' ' && *c != '-').collect();
    if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("card_number");
        err.message = Some("Card number must have 12 to 19 digits".into());
        return Err(err);
    }
    Ok(())
}

/// Expiry dates are `MM/YY`.
fn validate_expiry(value: &str) -> Result<(), ValidationError> {
    let valid = match value.split_once('/') {
        Some((mm, yy)) => {
            mm.len() == 2
                && yy.len() == 2
                && yy.chars().all(|c| c.is_ascii_digit())
                && matches!(mm.parse::<u8>(), Ok(1..=12))
        }
        None => false,
    };
    if !valid {
        let mut err = ValidationError::new("expiry");
        err.message = Some("Expiry must be in MM/YY format".into());
        return Err(err);
    }
    Ok(())
}
