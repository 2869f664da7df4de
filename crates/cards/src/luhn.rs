//! Luhn (mod 10) checksum used by card numbers.

/// `true` if `digits` is a non-empty string of ASCII digits whose Luhn checksum is zero.
///
/// Starting from the rightmost digit, every second digit is doubled and 9 is subtracted from
/// doubled values above 9. The number is valid when the sum of all digits is a multiple of 10.
pub fn is_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut checksum = 0;
    for (position, byte) in digits.bytes().rev().enumerate() {
        let Some(digit) = char::from(byte).to_digit(10) else {
            return false;
        };
        let value = if position % 2 == 1 {
            let doubled = digit * 2;
            if doubled > 9 {
                doubled - 9
            } else {
                doubled
            }
        } else {
            digit
        };
        checksum = (checksum + value) % 10;
    }

    checksum == 0
}

/// Digit which makes `payload` followed by it pass the checksum.
#[cfg(test)]
pub(crate) fn check_digit(payload: &str) -> u32 {
    let sum: u32 = payload
        .bytes()
        .rev()
        .enumerate()
        .filter_map(|(position, byte)| {
            char::from(byte).to_digit(10).map(|digit| {
                if position % 2 == 0 {
                    let doubled = digit * 2;
                    if doubled > 9 {
                        doubled - 9
                    } else {
                        doubled
                    }
                } else {
                    digit
                }
            })
        })
        .sum();
    (10 - sum % 10) % 10
}
