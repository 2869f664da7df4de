//! Brand-specific card rules.
//!
//! The validation core only knows the brand-agnostic limits. Scheme specifics (number lengths,
//! security code length, IIN prefixes) come from a [`BrandRules`] table which is usually read
//! from configuration, so a new scheme is a configuration change:
//!
//! ```toml
//! [brands.VISA]
//! lengths = [13, 16, 19]
//! cvv_length = 3
//! pattern = "^4"
//! ```

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::Deserialize;

use crate::validate;

/// Errors raised while building a [`BrandRule`].
#[derive(Debug, thiserror::Error)]
pub enum BrandRuleError {
    /// The IIN pattern is not a valid regular expression.
    #[error("invalid brand pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// A brand must allow at least one card number length.
    #[error("a brand rule needs at least one card number length")]
    NoLengths,
}

/// Number lengths, security code length and IIN pattern of one card brand.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "BrandRuleConfig")]
pub struct BrandRule {
    lengths: BTreeSet<usize>,
    cvv_length: usize,
    pattern: Option<Regex>,
}

#[derive(Deserialize)]
struct BrandRuleConfig {
    lengths: Vec<usize>,
    cvv_length: usize,
    pattern: Option<String>,
}

impl TryFrom<BrandRuleConfig> for BrandRule {
    type Error = BrandRuleError;

    fn try_from(config: BrandRuleConfig) -> Result<Self, Self::Error> {
        Self::new(config.lengths, config.cvv_length, config.pattern.as_deref())
    }
}

impl BrandRule {
    /// Build a rule. `pattern`, when given, is matched against the card number digits.
    pub fn new(
        lengths: impl IntoIterator<Item = usize>,
        cvv_length: usize,
        pattern: Option<&str>,
    ) -> Result<Self, BrandRuleError> {
        let lengths: BTreeSet<usize> = lengths.into_iter().collect();
        if lengths.is_empty() {
            return Err(BrandRuleError::NoLengths);
        }

        Ok(Self {
            lengths,
            cvv_length,
            pattern: pattern.map(Regex::new).transpose()?,
        })
    }

    /// Whether card numbers of the brand can have `length` digits.
    pub fn allows_number_length(&self, length: usize) -> bool {
        self.lengths.contains(&length)
    }

    /// Security code length of the brand.
    pub fn cvv_length(&self) -> usize {
        self.cvv_length
    }

    /// `true` if the rule has a pattern and `digits` match it.
    pub fn matches(&self, digits: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(digits))
    }

    /// `true` if `digits` match the pattern, or the rule has none.
    pub(crate) fn accepts_prefix(&self, digits: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(digits))
    }
}

/// Table of brand rules keyed by brand identifier, for example `VISA` or `AMEX`.
///
/// Identifiers are compared case-insensitively.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "BTreeMap<String, BrandRule>")]
pub struct BrandRules(BTreeMap<String, BrandRule>);

impl From<BTreeMap<String, BrandRule>> for BrandRules {
    fn from(rules: BTreeMap<String, BrandRule>) -> Self {
        rules.into_iter().fold(Self::default(), |table, (brand, rule)| {
            table.with_rule(brand, rule)
        })
    }
}

impl BrandRules {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule of `brand`.
    pub fn with_rule(mut self, brand: impl AsRef<str>, rule: BrandRule) -> Self {
        self.0.insert(brand_key(brand.as_ref()), rule);
        self
    }

    /// Rule of `brand`, if known.
    pub fn get(&self, brand: &str) -> Option<&BrandRule> {
        self.0.get(&brand_key(brand))
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of brands in the table.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Known brand identifiers, in detection order.
    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn brand_key(brand: &str) -> String {
    brand.trim().to_ascii_uppercase()
}

/// Detects the brand of a card from its number.
pub trait BrandDetector {
    /// Brand identifier for `number`, if one is recognized. Separators in `number` are ignored.
    fn detect_brand(&self, number: &str) -> Option<&str>;
}

impl BrandDetector for BrandRules {
    /// Picks the first brand, in identifier order, whose pattern matches the digits and which
    /// allows their length. Rules without a pattern never match.
    fn detect_brand(&self, number: &str) -> Option<&str> {
        let digits = validate::normalize_number(number);

        self.0
            .iter()
            .find(|(_, rule)| rule.matches(&digits) && rule.allows_number_length(digits.len()))
            .map(|(brand, _)| brand.as_str())
    }
}

/// Card number check for a specific brand.
///
/// The number must pass [`validate::is_number_valid`] with the Luhn check. When `rules` know
/// `brand`, its length must be one of the brand's lengths and it must match the brand's
/// pattern. Unknown brands get the brand-agnostic check only.
pub fn is_number_valid_for_brand(number: &str, brand: &str, rules: &BrandRules) -> bool {
    if !validate::is_number_valid(number, true) {
        return false;
    }

    rules.get(brand).map_or(true, |rule| {
        let digits = validate::normalize_number(number);
        rule.allows_number_length(digits.len()) && rule.accepts_prefix(&digits)
    })
}

/// Security code check for a specific brand.
///
/// The code must pass [`validate::is_cvv_valid`] and, when `rules` know `brand`, have exactly
/// the brand's security code length.
pub fn is_cvv_valid_for_brand(cvv: &str, brand: &str, rules: &BrandRules) -> bool {
    validate::is_cvv_valid(cvv)
        && rules
            .get(brand)
            .map_or(true, |rule| cvv.len() == rule.cvv_length())
}
