#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR" ), "/", "README.md"))]

pub mod brand;
pub mod consts;
pub mod errors;
pub mod luhn;
mod options;
mod params;
pub mod settings;
pub mod validate;

pub use self::{
    brand::{BrandDetector, BrandRule, BrandRules},
    errors::{CardField, MaskingError, ValidationError},
    options::CardPaymentOptions,
    params::{
        mask_card_number, CardNumberStrategy, CardPaymentParams, RawCardPaymentParams,
        ValidationContext,
    },
    settings::{Settings, ValidationSettings},
};
