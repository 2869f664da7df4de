//! Checks for the digit-only strings found in card and contact data.

use std::ops::RangeInclusive;

/// `true` if `value` is non-empty and made of ASCII digits only.
pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// `true` if `value` is made of ASCII digits only and its length falls within `lengths`.
pub fn is_digits_with_length(value: &str, lengths: RangeInclusive<usize>) -> bool {
    lengths.contains(&value.len()) && is_digits(value)
}

/// Drop the space and dash separators people type between digit groups.
pub fn strip_separators(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, ' ' | '-')).collect()
}
