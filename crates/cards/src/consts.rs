//! Limits and markers for card payment fields.

use std::ops::RangeInclusive;

/// Allowed number of characters in a trimmed cardholder name.
pub const HOLDER_LENGTH: RangeInclusive<usize> = 4..=127;

/// Allowed number of digits in a card number, separators excluded.
pub const CARD_NUMBER_LENGTH: RangeInclusive<usize> = 10..=19;

/// Allowed number of digits in a card security code.
pub const CVV_LENGTH: RangeInclusive<usize> = 3..=4;

/// Digits in an expiry month (`MM`).
pub const EXPIRY_MONTH_LENGTH: usize = 2;

/// Digits in an expiry year (`YYYY`).
pub const EXPIRY_YEAR_LENGTH: usize = 4;

/// Trailing card number digits which survive masking.
pub const VISIBLE_CARD_DIGITS: usize = 4;

/// Replaces every masked card number digit.
pub const MASK_CHAR: char = '*';
