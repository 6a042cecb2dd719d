//! Form payloads shared by checkout and account routes.
//!
//! Field names are camelCase so validation errors can be matched to inputs
//! by name. Optional fields left blank in the browser arrive as empty
//! strings and are treated as absent.

use serde::Deserialize;

use crate::commerce::{AddressInput, CustomerInput};

/// Address form data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressForm {
    pub full_name: String,
    pub company: Option<String>,
    pub street_line1: String,
    pub street_line2: Option<String>,
    pub city: String,
    pub province: Option<String>,
    pub postal_code: String,
    pub country_code: String,
    pub phone_number: Option<String>,
}

impl From<AddressForm> for AddressInput {
    fn from(form: AddressForm) -> Self {
        Self {
            full_name: form.full_name.trim().to_string(),
            company: non_blank(form.company),
            street_line1: form.street_line1.trim().to_string(),
            street_line2: non_blank(form.street_line2),
            city: form.city.trim().to_string(),
            province: non_blank(form.province),
            postal_code: form.postal_code.trim().to_string(),
            country_code: form.country_code.trim().to_uppercase(),
            phone_number: non_blank(form.phone_number),
        }
    }
}

/// Guest customer form data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerForm {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub phone_number: Option<String>,
}

impl From<CustomerForm> for CustomerInput {
    fn from(form: CustomerForm) -> Self {
        Self {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email_address: form.email_address.trim().to_string(),
            phone_number: non_blank(form.phone_number),
        }
    }
}

/// Trim an optional value, dropping it when blank.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
