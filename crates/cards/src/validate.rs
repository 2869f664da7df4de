//! Field predicates for card payment parameters.
//!
//! Every predicate is a pure function of its arguments. Checks which depend on the current date
//! take it as a parameter, see [`common_utils::date_time::DateSource`].

use common_utils::validation::{is_digits, is_digits_with_length, strip_separators};
use time::{Date, Month};

use crate::{consts, luhn};

/// `true` if the trimmed cardholder name has 4 to 127 characters.
pub fn is_holder_valid(holder: &str) -> bool {
    consts::HOLDER_LENGTH.contains(&holder.trim().chars().count())
}

/// `true` if the card number has 10 to 19 digits once spaces and dashes are removed.
///
/// With `luhn_check` set, the digits must also pass the Luhn checksum.
pub fn is_number_valid(number: &str, luhn_check: bool) -> bool {
    let digits = strip_separators(number);

    is_digits_with_length(&digits, consts::CARD_NUMBER_LENGTH)
        && (!luhn_check || luhn::is_valid(&digits))
}

/// `true` if the month is written as `MM` and lies between `01` and `12`.
pub fn is_expiry_month_valid(month: &str) -> bool {
    parse_expiry_month(month).is_some()
}

/// `true` if the year is written as `YYYY` and is not before the year of `today`.
pub fn is_expiry_year_valid(year: &str, today: Date) -> bool {
    parse_expiry_year(year).is_some_and(|year| year >= today.year())
}

/// `true` if the card expired before the month of `today` started.
///
/// A card stays valid through its whole expiry month. A missing or malformed month or year
/// counts as expired.
pub fn is_expired(month: Option<&str>, year: Option<&str>, today: Date) -> bool {
    let month = month.and_then(parse_expiry_month);
    let year = year.and_then(parse_expiry_year);

    match month.zip(year) {
        Some((month, year)) => (year, u8::from(month)) < (today.year(), u8::from(today.month())),
        None => true,
    }
}

/// `true` if the security code has 3 or 4 digits.
pub fn is_cvv_valid(cvv: &str) -> bool {
    is_digits_with_length(cvv, consts::CVV_LENGTH)
}

/// `true` if the country calling code is made of digits only.
pub fn is_country_code_valid(country_code: &str) -> bool {
    is_digits(country_code)
}

/// `true` if the mobile phone number is made of digits only.
pub fn is_mobile_phone_valid(mobile_phone: &str) -> bool {
    is_digits(mobile_phone)
}

/// Card number with spaces and dashes removed.
pub fn normalize_number(number: &str) -> String {
    strip_separators(number)
}

pub(crate) fn is_expiry_year_format_valid(year: &str) -> bool {
    parse_expiry_year(year).is_some()
}

fn parse_expiry_month(month: &str) -> Option<Month> {
    if !is_digits_with_length(month, consts::EXPIRY_MONTH_LENGTH..=consts::EXPIRY_MONTH_LENGTH) {
        return None;
    }
    month
        .parse::<u8>()
        .ok()
        .and_then(|month| Month::try_from(month).ok())
}

fn parse_expiry_year(year: &str) -> Option<i32> {
    if !is_digits_with_length(year, consts::EXPIRY_YEAR_LENGTH..=consts::EXPIRY_YEAR_LENGTH) {
        return None;
    }
    year.parse().ok()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_case::test_case;
    use time::macros::date;

    use super::*;

    const TODAY: Date = date!(2024 - 06 - 15);

    #[test_case("" => false ; "empty")]
    #[test_case("Bob" => false ; "three characters")]
    #[test_case("   Bob   " => false ; "three characters after trimming")]
    #[test_case("Jane" => true ; "four characters")]
    #[test_case("Bobby" => true ; "five characters")]
    #[test_case("Zoë Ł" => true ; "non ascii characters count once")]
    fn test_is_holder_valid(holder: &str) -> bool {
        is_holder_valid(holder)
    }

    #[test]
    fn test_holder_upper_bound() {
        assert!(is_holder_valid(&"a".repeat(127)));
        assert!(!is_holder_valid(&"a".repeat(128)));
    }

    #[test_case("4242424242424242", true => true ; "valid with luhn")]
    #[test_case("4242424242424241", true => false ; "checksum failure")]
    #[test_case("4242424242424241", false => true ; "checksum ignored")]
    #[test_case("4242 4242-4242 4242", true => true ; "separators are stripped")]
    #[test_case("424242424", false => false ; "nine digits")]
    #[test_case("4242424242", false => true ; "ten digits")]
    #[test_case("4242424242424242424", false => true ; "nineteen digits")]
    #[test_case("42424242424242424242", false => false ; "twenty digits")]
    #[test_case("4242x42424242424", false => false ; "letter")]
    #[test_case("4242.4242.4242.4242", false => false ; "dots are not separators")]
    #[test_case("", false => false ; "empty")]
    fn test_is_number_valid(number: &str, luhn_check: bool) -> bool {
        is_number_valid(number, luhn_check)
    }

    #[test_case("01" => true ; "january")]
    #[test_case("12" => true ; "december")]
    #[test_case("00" => false ; "zero")]
    #[test_case("13" => false ; "thirteen")]
    #[test_case("1" => false ; "single digit")]
    #[test_case("012" => false ; "three digits")]
    #[test_case("+1" => false ; "sign")]
    fn test_is_expiry_month_valid(month: &str) -> bool {
        is_expiry_month_valid(month)
    }

    #[test_case("2024" => true ; "current year")]
    #[test_case("2031" => true ; "future year")]
    #[test_case("2023" => false ; "past year")]
    #[test_case("24" => false ; "two digits")]
    #[test_case("20245" => false ; "five digits")]
    #[test_case("２０２４" => false ; "full width digits")]
    fn test_is_expiry_year_valid(year: &str) -> bool {
        is_expiry_year_valid(year, TODAY)
    }

    #[test_case(Some("05"), Some("2024") => true ; "previous month")]
    #[test_case(Some("06"), Some("2024") => false ; "current month")]
    #[test_case(Some("07"), Some("2024") => false ; "next month")]
    #[test_case(Some("12"), Some("2023") => true ; "previous year")]
    #[test_case(Some("01"), Some("2025") => false ; "next year")]
    #[test_case(None, Some("2030") => true ; "missing month")]
    #[test_case(Some("01"), None => true ; "missing year")]
    #[test_case(Some("13"), Some("2030") => true ; "malformed month")]
    fn test_is_expired(month: Option<&str>, year: Option<&str>) -> bool {
        is_expired(month, year, TODAY)
    }

    #[test]
    fn test_is_expired_at_month_boundaries() {
        assert!(!is_expired(Some("06"), Some("2024"), date!(2024 - 06 - 30)));
        assert!(is_expired(Some("06"), Some("2024"), date!(2024 - 07 - 01)));
    }

    #[test_case("12" => false ; "two digits")]
    #[test_case("123" => true ; "three digits")]
    #[test_case("1234" => true ; "four digits")]
    #[test_case("12345" => false ; "five digits")]
    #[test_case("12a" => false ; "letter")]
    #[test_case("" => false ; "empty")]
    fn test_is_cvv_valid(cvv: &str) -> bool {
        is_cvv_valid(cvv)
    }

    #[test_case("49" => true ; "germany")]
    #[test_case("1" => true ; "single digit")]
    #[test_case("+49" => false ; "plus sign")]
    #[test_case("" => false ; "empty")]
    fn test_is_country_code_valid(country_code: &str) -> bool {
        is_country_code_valid(country_code)
    }

    #[test_case("15112345678" => true ; "digits")]
    #[test_case("151 12345678" => false ; "space")]
    #[test_case("" => false ; "empty")]
    fn test_is_mobile_phone_valid(mobile_phone: &str) -> bool {
        is_mobile_phone_valid(mobile_phone)
    }

    proptest! {
        #[test]
        fn proptest_predicates_are_pure(input in "\\PC{0,24}") {
            prop_assert_eq!(is_holder_valid(&input), is_holder_valid(&input));
            prop_assert_eq!(is_number_valid(&input, true), is_number_valid(&input, true));
            prop_assert_eq!(is_expiry_month_valid(&input), is_expiry_month_valid(&input));
            prop_assert_eq!(is_expiry_year_valid(&input, TODAY), is_expiry_year_valid(&input, TODAY));
            prop_assert_eq!(is_cvv_valid(&input), is_cvv_valid(&input));
            prop_assert_eq!(is_country_code_valid(&input), is_country_code_valid(&input));
            prop_assert_eq!(is_mobile_phone_valid(&input), is_mobile_phone_valid(&input));
        }

        #[test]
        fn proptest_luhn_numbers_are_valid(payload in "[0-9]{9,18}") {
            let number = format!("{payload}{}", luhn::check_digit(&payload));
            prop_assert!(is_number_valid(&number, true));
        }

        #[test]
        fn proptest_luhn_numbers_with_separators_are_valid(
            payload in "[0-9]{9,18}",
            separator in prop_oneof![Just(" "), Just("-")],
        ) {
            let number = format!("{payload}{}", luhn::check_digit(&payload));
            let grouped = number
                .chars()
                .collect::<Vec<_>>()
                .chunks(4)
                .map(|group| group.iter().collect::<String>())
                .collect::<Vec<_>>()
                .join(separator);
            prop_assert!(is_number_valid(&grouped, true));
        }

        #[test]
        fn proptest_year_validity_matches_expiry(year in 2000i32..2100) {
            let year = year.to_string();
            prop_assert_eq!(
                is_expiry_year_valid(&year, TODAY),
                !is_expired(Some("12"), Some(&year), TODAY)
            );
        }
    }
}
