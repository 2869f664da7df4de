//! Errors reported while validating and masking card payment parameters.

use serde::Serialize;
use strum::{Display, EnumString};

/// Identifies the card payment field a validation error is about.
///
/// The `Display` form is a stable snake_case key that callers can use to look up a localized
/// message.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, Hash, PartialEq, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    /// Checkout session identifier.
    CheckoutId,
    /// Cardholder name.
    Holder,
    /// Card number.
    Number,
    /// Expiry month, `MM`.
    ExpiryMonth,
    /// Expiry year, `YYYY`.
    ExpiryYear,
    /// Card security code.
    Cvv,
    /// Customer country calling code.
    CountryCode,
    /// Customer mobile phone.
    MobilePhone,
}

/// Validation errors.
#[allow(missing_docs)] // Only to prevent warnings about struct fields not being documented
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was not provided or was blank.
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: CardField },

    /// The field has the wrong characters or the wrong length.
    #[error("Invalid format for field: {field}")]
    InvalidFormat { field: CardField },

    /// The card number does not pass the Luhn checksum.
    #[error("Card number failed the checksum")]
    FailedChecksum,

    /// The expiry date lies before the current month.
    #[error("Card expired, see field: {field}")]
    Expired { field: CardField },

    /// The country code is not made of digits only.
    #[error("Country code must contain digits only")]
    InvalidCountryCode,

    /// The mobile phone is not made of digits only.
    #[error("Mobile phone must contain digits only")]
    InvalidPhone,
}

impl ValidationError {
    /// The field this error is about.
    pub fn field(&self) -> CardField {
        match self {
            Self::MissingRequiredField { field }
            | Self::InvalidFormat { field }
            | Self::Expired { field } => *field,
            Self::FailedChecksum => CardField::Number,
            Self::InvalidCountryCode => CardField::CountryCode,
            Self::InvalidPhone => CardField::MobilePhone,
        }
    }
}

/// Misuse of the masking transformation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum MaskingError {
    /// Masking may run once, after a single successful authorization.
    #[error("Card payment parameters are already masked")]
    AlreadyMasked,
}
