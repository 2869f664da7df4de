//! Personal Identifiable Information protection.

use std::fmt;

use masking::{Strategy, WithType};
#[cfg(feature = "logs")]
use sdk_env::logger;

/// Strategy for masking a phone number or any other contact digits
#[derive(Debug)]
pub enum PhoneNumberStrategy {}

impl<T> Strategy<T> for PhoneNumberStrategy
where
    T: AsRef<str>,
{
    fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val_str: &str = val.as_ref();

        match val_str
            .len()
            .checked_sub(4)
            .filter(|start| *start > 0)
            .and_then(|start| val_str.get(start..).map(|last4| (start, last4)))
        {
            // masks everything but the last 4 digits
            Some((start, last4)) => write!(f, "{}{}", "*".repeat(start), last4),
            None => {
                #[cfg(feature = "logs")]
                logger::debug!("phone number too short to partially mask");
                WithType::fmt(val, f)
            }
        }
    }
}
