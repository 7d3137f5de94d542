use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::DefaultFlag;

/// Opaque address identifier.
///
/// Fresh ids are UUID v4 strings; ids coming from seed data or the backend are
/// taken verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(String);

impl AddressId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AddressId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AddressId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum AddressType {
    #[default]
    Home,
    Work,
    Other,
}

/// A delivery address owned by an `AddressBook`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(rename = "type")]
    pub address_type: AddressType,
    pub is_default: bool,
}

impl Address {
    pub(crate) fn from_input(id: AddressId, input: NewAddress) -> Self {
        Self {
            id,
            name: input.name,
            phone: input.phone,
            address_line1: input.address_line1,
            address_line2: input.address_line2,
            city: input.city,
            state: input.state,
            pincode: input.pincode,
            address_type: input.address_type,
            is_default: input.is_default,
        }
    }

    /// Overwrites the fields named in `patch`. The default flag is owned by
    /// the address book and is not touched here.
    pub(crate) fn apply(&mut self, patch: AddressPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(line1) = patch.address_line1 {
            self.address_line1 = line1;
        }
        if let Some(line2) = patch.address_line2 {
            self.address_line2 = line2;
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(pincode) = patch.pincode {
            self.pincode = pincode;
        }
        if let Some(address_type) = patch.address_type {
            self.address_type = address_type;
        }
    }

    /// Single-line rendering used on order summaries.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        if let Some(line2) = self.address_line2.as_deref().filter(|l| !l.trim().is_empty()) {
            parts.push(line2);
        }
        format!(
            "{}, {}, {} - {}",
            parts.join(", "),
            self.city,
            self.state,
            self.pincode
        )
    }
}

impl DefaultFlag for Address {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default_flag(&mut self, value: bool) {
        self.is_default = value;
    }
}

/// Input for adding an address
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewAddress {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(custom = "validate_not_blank")]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub city: String,
    #[validate(custom = "validate_not_blank")]
    pub state: String,
    #[validate(custom = "validate_pincode")]
    pub pincode: String,
    #[serde(rename = "type", default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

/// Partial update for an existing address. `None` leaves a field untouched;
/// `address_line2: Some(None)` clears the second line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AddressPatch {
    #[validate(custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub address_line1: Option<String>,
    pub address_line2: Option<Option<String>>,
    #[validate(custom = "validate_not_blank")]
    pub city: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub state: Option<String>,
    #[validate(custom = "validate_pincode")]
    pub pincode: Option<String>,
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub is_default: Option<bool>,
}

impl AddressPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Please fill all required fields".into());
        return Err(err);
    }
    Ok(())
}

fn validate_pincode(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.len() != 6 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("pincode");
        err.message = Some("Pincode must be 6 digits".into());
        return Err(err);
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-'))
        .collect();
    if !(10..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone number must have 10 to 15 digits".into());
        return Err(err);
    }
    Ok(())
}
