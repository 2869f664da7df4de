use std::num::NonZeroU32;

use common_utils::{errors::CustomResult, pii::PhoneNumberStrategy};
use error_stack::report;
use masking::{PeekInterface, Secret};
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, validate};

/// Secondary fields of a card payment which may change after the card data is validated.
///
/// Setters store values as given. Run the predicates in [`crate::validate`] first, or call
/// [`CardPaymentOptions::validate`] once all fields are set.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CardPaymentOptions {
    country_code: Option<String>,
    mobile_phone: Option<Secret<String, PhoneNumberStrategy>>,
    tokenization_enabled: bool,
    number_of_installments: Option<NonZeroU32>,
}

impl CardPaymentOptions {
    /// No country code or phone, tokenization off, no installments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Customer country calling code.
    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    /// Replace the country calling code.
    pub fn set_country_code(&mut self, country_code: Option<String>) -> &mut Self {
        self.country_code = country_code;
        self
    }

    /// Customer mobile phone, masked in `Debug` output.
    pub fn mobile_phone(&self) -> Option<&Secret<String, PhoneNumberStrategy>> {
        self.mobile_phone.as_ref()
    }

    /// Replace the mobile phone.
    pub fn set_mobile_phone(&mut self, mobile_phone: Option<String>) -> &mut Self {
        self.mobile_phone = mobile_phone.map(Secret::new);
        self
    }

    /// Whether the payment data should be stored for later payments. Off by default.
    pub fn is_tokenization_enabled(&self) -> bool {
        self.tokenization_enabled
    }

    /// Turn tokenization on or off.
    pub fn set_tokenization_enabled(&mut self, tokenization_enabled: bool) -> &mut Self {
        self.tokenization_enabled = tokenization_enabled;
        self
    }

    /// Number of installments the payment is split into.
    pub fn number_of_installments(&self) -> Option<NonZeroU32> {
        self.number_of_installments
    }

    /// Replace the number of installments.
    pub fn set_number_of_installments(
        &mut self,
        number_of_installments: Option<NonZeroU32>,
    ) -> &mut Self {
        self.number_of_installments = number_of_installments;
        self
    }

    /// Check the fields that are set: country code first, then mobile phone.
    pub fn validate(&self) -> CustomResult<(), ValidationError> {
        if let Some(country_code) = self.country_code() {
            if !validate::is_country_code_valid(country_code) {
                return Err(report!(ValidationError::InvalidCountryCode));
            }
        }

        if let Some(mobile_phone) = self.mobile_phone() {
            if !validate::is_mobile_phone_valid(mobile_phone.peek()) {
                return Err(report!(ValidationError::InvalidPhone));
            }
        }

        Ok(())
    }
}
