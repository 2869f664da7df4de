use std::fmt;

use common_utils::{date_time::DateSource, errors::CustomResult, validation};
use error_stack::report;
use masking::{PeekInterface, Secret, Strategy, StrongSecret, WithType};
use sdk_env::logger;
use serde::Deserialize;
use time::Date;

use crate::{
    brand::{BrandDetector, BrandRules},
    consts,
    errors::{CardField, MaskingError, ValidationError},
    settings::Settings,
    validate,
};

/// Card payment fields as entered by the payer, before any validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawCardPaymentParams {
    /// Checkout session the payment belongs to.
    pub checkout_id: String,
    /// Brand identifier. Leave empty to have the brand detected.
    pub payment_brand: Option<String>,
    /// Name on the card.
    pub holder: Option<Secret<String>>,
    /// Card number, spaces and dashes allowed.
    pub number: StrongSecret<String, CardNumberStrategy>,
    /// Expiry month, `MM`.
    pub expiry_month: Option<Secret<String>>,
    /// Expiry year, `YYYY`.
    pub expiry_year: Option<Secret<String>>,
    /// Leave empty when the checkout does not ask for a security code.
    pub cvv: Option<StrongSecret<String>>,
}

/// What the validating constructor needs to know about the checkout it runs in.
#[derive(Clone, Copy, Debug)]
pub struct ValidationContext<'a> {
    /// Date expiry checks compare against.
    pub today: Date,
    /// Whether the card number must pass the Luhn checksum.
    pub luhn_check: bool,
    /// Whether a missing security code is an error.
    pub cvv_required: bool,
    /// Brand rules for detection and brand-specific checks, if any.
    pub brand_rules: Option<&'a BrandRules>,
}

impl<'a> ValidationContext<'a> {
    /// Luhn check and security code required, no brand rules.
    pub fn new(today: Date) -> Self {
        Self {
            today,
            luhn_check: true,
            cvv_required: true,
            brand_rules: None,
        }
    }

    /// Context described by `settings`, dated by `dates`.
    ///
    /// An empty brand table disables brand detection and brand-specific checks.
    pub fn from_settings(settings: &'a Settings, dates: &impl DateSource) -> Self {
        Self {
            today: dates.today(),
            luhn_check: settings.validation.luhn_check,
            cvv_required: settings.validation.cvv_required,
            brand_rules: (!settings.brands.is_empty()).then_some(&settings.brands),
        }
    }

    /// Same context, checking brands against `brand_rules`.
    pub fn with_brand_rules(mut self, brand_rules: &'a BrandRules) -> Self {
        self.brand_rules = Some(brand_rules);
        self
    }
}

/// Validated parameters of one card payment.
///
/// Only [`CardPaymentParams::new`] creates values of this type, so every instance passed all
/// field checks. The card fields have no setters. The only change allowed is
/// [`CardPaymentParams::mask`], once the payment is authorized.
///
/// Not `Clone`: a copy would keep the card number and security code
/// in cleartext after the original is masked.
#[derive(Debug)]
pub struct CardPaymentParams {
    checkout_id: String,
    payment_brand: Option<String>,
    holder: Secret<String>,
    number: StrongSecret<String, CardNumberStrategy>,
    expiry_month: Secret<String>,
    expiry_year: Secret<String>,
    cvv: Option<StrongSecret<String>>,
    masked: bool,
}

impl CardPaymentParams {
    /// Validate `raw` and build the parameters.
    ///
    /// Fields are checked in this order and the first failure is returned: checkout id, holder,
    /// number (format, then checksum when required), expiry month, expiry year, expiry date,
    /// security code, then the brand rules of `context`, if any.
    pub fn new(
        raw: RawCardPaymentParams,
        context: &ValidationContext<'_>,
    ) -> CustomResult<Self, ValidationError> {
        Self::validate(raw, context).inspect_err(|error| {
            logger::debug!(
                field = %error.current_context().field(),
                reason = %error.current_context(),
                "card payment parameters rejected"
            );
        })
    }

    fn validate(
        raw: RawCardPaymentParams,
        context: &ValidationContext<'_>,
    ) -> CustomResult<Self, ValidationError> {
        let RawCardPaymentParams {
            checkout_id,
            payment_brand,
            holder,
            number,
            expiry_month,
            expiry_year,
            cvv,
        } = raw;

        let checkout_id = checkout_id.trim();
        if checkout_id.is_empty() {
            return Err(missing(CardField::CheckoutId));
        }

        let holder = required(holder.as_ref().map(PeekInterface::peek), CardField::Holder)?;
        if !validate::is_holder_valid(holder) {
            return Err(invalid(CardField::Holder)
                .attach_printable("holder must have 4 to 127 characters"));
        }

        if number.peek().trim().is_empty() {
            return Err(missing(CardField::Number));
        }
        if !validate::is_number_valid(number.peek(), false) {
            return Err(invalid(CardField::Number)
                .attach_printable("card number must have 10 to 19 digits"));
        }
        if context.luhn_check && !validate::is_number_valid(number.peek(), true) {
            return Err(report!(ValidationError::FailedChecksum));
        }
        let digits = validate::normalize_number(number.peek());

        let month = required(
            expiry_month.as_ref().map(PeekInterface::peek),
            CardField::ExpiryMonth,
        )?;
        if !validate::is_expiry_month_valid(month) {
            return Err(invalid(CardField::ExpiryMonth)
                .attach_printable("expiry month must be written as MM, 01 to 12"));
        }

        let year = required(
            expiry_year.as_ref().map(PeekInterface::peek),
            CardField::ExpiryYear,
        )?;
        if !validate::is_expiry_year_format_valid(year) {
            return Err(invalid(CardField::ExpiryYear)
                .attach_printable("expiry year must be written as YYYY"));
        }
        if !validate::is_expiry_year_valid(year, context.today) {
            return Err(expired(CardField::ExpiryYear));
        }
        if validate::is_expired(Some(month), Some(year), context.today) {
            return Err(expired(CardField::ExpiryMonth));
        }

        let cvv = cvv.filter(|cvv| !cvv.peek().is_empty());
        match &cvv {
            Some(cvv) if !validate::is_cvv_valid(cvv.peek()) => {
                return Err(invalid(CardField::Cvv)
                    .attach_printable("security code must have 3 or 4 digits"));
            }
            None if context.cvv_required => return Err(missing(CardField::Cvv)),
            _ => {}
        }

        let mut payment_brand = payment_brand
            .map(|brand| brand.trim().to_owned())
            .filter(|brand| !brand.is_empty());

        if let Some(rules) = context.brand_rules {
            if payment_brand.is_none() {
                payment_brand = rules.detect_brand(&digits).map(ToOwned::to_owned);
                logger::debug!(payment_brand = ?payment_brand, "card brand detected");
            }

            if let Some(rule) = payment_brand.as_deref().and_then(|brand| rules.get(brand)) {
                if !rule.allows_number_length(digits.len()) {
                    return Err(invalid(CardField::Number)
                        .attach_printable("card number length not used by the card brand"));
                }
                if !rule.accepts_prefix(&digits) {
                    return Err(invalid(CardField::Number)
                        .attach_printable("card number prefix not issued by the card brand"));
                }
                if cvv
                    .as_ref()
                    .is_some_and(|cvv| cvv.peek().len() != rule.cvv_length())
                {
                    return Err(invalid(CardField::Cvv)
                        .attach_printable("security code length not used by the card brand"));
                }
            }
        }

        Ok(Self {
            checkout_id: checkout_id.to_owned(),
            payment_brand,
            holder: Secret::new(holder.trim().to_owned()),
            number: StrongSecret::new(digits),
            expiry_month: Secret::new(month.to_owned()),
            expiry_year: Secret::new(year.to_owned()),
            cvv,
            masked: false,
        })
    }

    /// Checkout session, trimmed.
    pub fn checkout_id(&self) -> &str {
        &self.checkout_id
    }

    /// Brand given by the caller or detected from the brand rules.
    pub fn payment_brand(&self) -> Option<&str> {
        self.payment_brand.as_deref()
    }

    /// Card holder name, trimmed.
    pub fn holder(&self) -> &Secret<String> {
        &self.holder
    }

    /// Card number digits, or their masked form once [`CardPaymentParams::mask`] ran.
    pub fn number(&self) -> &StrongSecret<String, CardNumberStrategy> {
        &self.number
    }

    /// Last four digits of the card number. Available before and after masking.
    pub fn last4(&self) -> &str {
        let number = self.number.peek();
        number
            .get(number.len().saturating_sub(consts::VISIBLE_CARD_DIGITS)..)
            .unwrap_or_default()
    }

    /// Expiry month, `MM`.
    pub fn expiry_month(&self) -> &Secret<String> {
        &self.expiry_month
    }

    /// Expiry year, `YYYY`.
    pub fn expiry_year(&self) -> &Secret<String> {
        &self.expiry_year
    }

    /// Security code, absent when none was given or once the parameters are masked.
    pub fn cvv(&self) -> Option<&StrongSecret<String>> {
        self.cvv.as_ref()
    }

    /// Whether [`CardPaymentParams::mask`] already ran.
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Redact the card data once the payment is authorized.
    ///
    /// Keeps the last four digits of the card number, replaces the others with `*` and drops
    /// the security code. The replaced values are wiped from memory. There is no way back.
    ///
    /// Call it exactly once, after a single successful authorization. A second call is a
    /// caller bug: it returns [`MaskingError::AlreadyMasked`] and changes nothing.
    pub fn mask(&mut self) -> CustomResult<(), MaskingError> {
        if self.masked {
            logger::error!(
                checkout_id = %self.checkout_id,
                "masking requested for card payment parameters that are already masked"
            );
            return Err(report!(MaskingError::AlreadyMasked));
        }

        self.number = StrongSecret::new(mask_card_number(self.number.peek()));
        self.cvv = None;
        self.masked = true;

        logger::debug!(checkout_id = %self.checkout_id, "card payment parameters masked");
        Ok(())
    }
}

/// `number` with every character except the last four replaced by `*`.
pub fn mask_card_number(number: &str) -> String {
    let visible_from = number
        .chars()
        .count()
        .saturating_sub(consts::VISIBLE_CARD_DIGITS);

    number
        .chars()
        .enumerate()
        .map(|(position, c)| {
            if position < visible_from {
                consts::MASK_CHAR
            } else {
                c
            }
        })
        .collect()
}

fn missing(field: CardField) -> error_stack::Report<ValidationError> {
    report!(ValidationError::MissingRequiredField { field })
}

fn invalid(field: CardField) -> error_stack::Report<ValidationError> {
    report!(ValidationError::InvalidFormat { field })
}

fn expired(field: CardField) -> error_stack::Report<ValidationError> {
    report!(ValidationError::Expired { field }).attach_printable("card expired")
}

fn required(value: Option<&String>, field: CardField) -> CustomResult<&str, ValidationError> {
    value
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| missing(field))
}

/// Shows the first six digits of a card number and masks the rest.
#[derive(Debug)]
pub enum CardNumberStrategy {}

impl<T> Strategy<T> for CardNumberStrategy
where
    T: AsRef<str>,
{
    fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val_str: &str = val.as_ref();

        if val_str.len() < 15 || val_str.len() > 19 || !validation::is_digits(val_str) {
            return WithType::fmt(val, f);
        }

        if let Some(value) = val_str.get(..6) {
            write!(f, "{}{}", value, "*".repeat(val_str.len() - 6))
        } else {
            WithType::fmt(val, f)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use time::macros::date;

    use super::*;
    use crate::brand::BrandRule;

    const TODAY: Date = date!(2024 - 06 - 15);

    fn raw() -> RawCardPaymentParams {
        RawCardPaymentParams {
            checkout_id: "8a82944a4cc25ebf014cc2c782423202".to_string(),
            payment_brand: Some("VISA".to_string()),
            holder: Some(Secret::new("Jane Jones".to_string())),
            number: StrongSecret::new("4242 4242 4242 4242".to_string()),
            expiry_month: Some(Secret::new("07".to_string())),
            expiry_year: Some(Secret::new("2027".to_string())),
            cvv: Some(StrongSecret::new("123".to_string())),
        }
    }

    fn error_of(raw: RawCardPaymentParams, context: &ValidationContext<'_>) -> ValidationError {
        *CardPaymentParams::new(raw, context)
            .unwrap_err()
            .current_context()
    }

    #[test]
    fn valid_parameters_are_normalized() {
        let params = CardPaymentParams::new(
            RawCardPaymentParams {
                holder: Some(Secret::new("  Jane Jones ".to_string())),
                payment_brand: Some(" VISA ".to_string()),
                ..raw()
            },
            &ValidationContext::new(TODAY),
        )
        .unwrap();

        assert_eq!(params.checkout_id(), "8a82944a4cc25ebf014cc2c782423202");
        assert_eq!(params.payment_brand(), Some("VISA"));
        assert_eq!(params.holder().peek(), "Jane Jones");
        assert_eq!(params.number().peek(), "4242424242424242");
        assert_eq!(params.expiry_month().peek(), "07");
        assert_eq!(params.expiry_year().peek(), "2027");
        assert_eq!(params.cvv().map(|cvv| cvv.peek().as_str()), Some("123"));
        assert_eq!(params.last4(), "4242");
        assert!(!params.is_masked());
    }

    #[test]
    fn blank_checkout_id_is_missing() {
        let raw = RawCardPaymentParams {
            checkout_id: "  ".to_string(),
            ..raw()
        };

        assert_eq!(
            error_of(raw, &ValidationContext::new(TODAY)),
            ValidationError::MissingRequiredField {
                field: CardField::CheckoutId
            }
        );
    }

    #[test]
    fn checksum_is_only_checked_when_required() {
        let raw = || RawCardPaymentParams {
            number: StrongSecret::new("4242424242424241".to_string()),
            ..raw()
        };
        let lenient = ValidationContext {
            luhn_check: false,
            ..ValidationContext::new(TODAY)
        };

        assert_eq!(
            error_of(raw(), &ValidationContext::new(TODAY)),
            ValidationError::FailedChecksum
        );
        assert!(CardPaymentParams::new(raw(), &lenient).is_ok());
    }

    #[test]
    fn year_before_current_year_is_expired() {
        let raw = RawCardPaymentParams {
            expiry_year: Some(Secret::new("2023".to_string())),
            ..raw()
        };

        assert_eq!(
            error_of(raw, &ValidationContext::new(TODAY)),
            ValidationError::Expired {
                field: CardField::ExpiryYear
            }
        );
    }

    #[test]
    fn month_before_current_month_is_expired() {
        let raw = RawCardPaymentParams {
            expiry_month: Some(Secret::new("05".to_string())),
            expiry_year: Some(Secret::new("2024".to_string())),
            ..raw()
        };

        assert_eq!(
            error_of(raw, &ValidationContext::new(TODAY)),
            ValidationError::Expired {
                field: CardField::ExpiryMonth
            }
        );
    }

    #[test]
    fn cvv_may_be_omitted_when_not_required() {
        let optional = ValidationContext {
            cvv_required: false,
            ..ValidationContext::new(TODAY)
        };

        let params = CardPaymentParams::new(
            RawCardPaymentParams {
                cvv: None,
                ..raw()
            },
            &optional,
        )
        .unwrap();
        assert!(params.cvv().is_none());

        assert_eq!(
            error_of(
                RawCardPaymentParams {
                    cvv: Some(StrongSecret::new(String::new())),
                    ..raw()
                },
                &ValidationContext::new(TODAY)
            ),
            ValidationError::MissingRequiredField {
                field: CardField::Cvv
            }
        );
        assert_eq!(
            error_of(
                RawCardPaymentParams {
                    cvv: Some(StrongSecret::new("12".to_string())),
                    ..raw()
                },
                &optional
            ),
            ValidationError::InvalidFormat {
                field: CardField::Cvv
            }
        );
    }

    #[test]
    fn brand_rules_refine_lengths() {
        let rules = BrandRules::new()
            .with_rule("VISA", BrandRule::new([16], 3, Some("^4")).unwrap())
            .with_rule("AMEX", BrandRule::new([15], 4, Some("^3[47]")).unwrap());
        let context = ValidationContext::new(TODAY).with_brand_rules(&rules);

        assert_eq!(
            error_of(
                RawCardPaymentParams {
                    cvv: Some(StrongSecret::new("1234".to_string())),
                    ..raw()
                },
                &context
            ),
            ValidationError::InvalidFormat {
                field: CardField::Cvv
            }
        );
        assert_eq!(
            error_of(
                RawCardPaymentParams {
                    payment_brand: Some("AMEX".to_string()),
                    ..raw()
                },
                &context
            ),
            ValidationError::InvalidFormat {
                field: CardField::Number
            }
        );
        assert!(CardPaymentParams::new(
            RawCardPaymentParams {
                payment_brand: Some("DISCOVER".to_string()),
                ..raw()
            },
            &context
        )
        .is_ok());
    }

    #[test]
    fn brand_rules_refine_prefix() {
        let rules = BrandRules::new()
            .with_rule("VISA", BrandRule::new([16], 3, Some("^4")).unwrap())
            .with_rule("PRIVATE_LABEL", BrandRule::new([16], 3, None).unwrap());
        let context = ValidationContext::new(TODAY).with_brand_rules(&rules);
        let mastercard = |brand: &str| RawCardPaymentParams {
            payment_brand: Some(brand.to_string()),
            number: StrongSecret::new("5555 5555 5555 4444".to_string()),
            ..raw()
        };

        assert!(!crate::brand::is_number_valid_for_brand(
            "5555555555554444",
            "VISA",
            &rules
        ));
        assert_eq!(
            error_of(mastercard("VISA"), &context),
            ValidationError::InvalidFormat {
                field: CardField::Number
            }
        );
        assert!(CardPaymentParams::new(mastercard("PRIVATE_LABEL"), &context).is_ok());
    }

    #[test]
    fn brand_is_detected_when_omitted() {
        let rules = BrandRules::new()
            .with_rule("AMEX", BrandRule::new([15], 4, Some("^3[47]")).unwrap());
        let raw = RawCardPaymentParams {
            payment_brand: None,
            number: StrongSecret::new("3714 496353 98431".to_string()),
            cvv: Some(StrongSecret::new("1234".to_string())),
            ..raw()
        };

        let context = ValidationContext::new(TODAY).with_brand_rules(&rules);
        let detected = CardPaymentParams::new(raw.clone(), &context).unwrap();
        let undetected = CardPaymentParams::new(raw, &ValidationContext::new(TODAY)).unwrap();

        assert_eq!(detected.payment_brand(), Some("AMEX"));
        assert_eq!(undetected.payment_brand(), None);
    }

    #[test]
    fn debug_output_has_no_cleartext_card_data() {
        let params = CardPaymentParams::new(raw(), &ValidationContext::new(TODAY)).unwrap();
        let debug = format!("{params:?}");

        assert!(!debug.contains("4242424242424242"));
        assert!(debug.contains("424242**********"));
        assert!(!debug.contains("\"123\""));
        assert!(!debug.contains("Jane Jones"));
    }

    #[test]
    fn mask_keeps_last_four_digits_and_clears_cvv() {
        let mut params = CardPaymentParams::new(raw(), &ValidationContext::new(TODAY)).unwrap();

        params.mask().unwrap();

        assert!(params.is_masked());
        assert_eq!(params.number().peek(), "************4242");
        assert_eq!(params.last4(), "4242");
        assert!(params.cvv().is_none());
        assert_eq!(params.holder().peek(), "Jane Jones");
        assert_eq!(params.expiry_month().peek(), "07");
        assert_eq!(params.expiry_year().peek(), "2027");
        assert_eq!(params.payment_brand(), Some("VISA"));
    }

    #[test]
    fn second_mask_is_rejected() {
        let mut params = CardPaymentParams::new(raw(), &ValidationContext::new(TODAY)).unwrap();
        params.mask().unwrap();

        let error = params.mask().unwrap_err();

        assert_eq!(*error.current_context(), MaskingError::AlreadyMasked);
        assert_eq!(params.number().peek(), "************4242");
    }

    #[test]
    fn test_mask_card_number() {
        assert_eq!(mask_card_number("4242424242"), "******4242");
        assert_eq!(mask_card_number("4242424242424242424"), "***************4242");
        assert_eq!(mask_card_number("424"), "424");
    }

    #[test]
    fn test_valid_card_number_masking() {
        let secret: Secret<String, CardNumberStrategy> =
            Secret::new("1234567890987654".to_string());
        assert_eq!("123456**********", format!("{secret:?}"));
    }

    #[test]
    fn test_short_card_number_masking() {
        let secret: Secret<String, CardNumberStrategy> = Secret::new("1234567890".to_string());
        assert_eq!("*** alloc::string::String ***", format!("{secret:?}"));
    }

    #[test]
    fn test_masked_card_number_masking() {
        let secret: Secret<String, CardNumberStrategy> =
            Secret::new("************4242".to_string());
        assert_eq!("*** alloc::string::String ***", format!("{secret:?}"));
    }
}
