#![warn(missing_docs, missing_debug_implementations)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR" ), "/", "README.md"))]

pub mod errors;
pub mod pii;
pub mod validation;

/// Date-time utilities.
pub mod date_time {
    use error_stack::ResultExt;
    use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

    use crate::errors::{CustomResult, ParsingError};

    /// Create a new [`PrimitiveDateTime`] with the current date and time in UTC.
    pub fn now() -> PrimitiveDateTime {
        let utc_date_time = OffsetDateTime::now_utc();
        PrimitiveDateTime::new(utc_date_time.date(), utc_date_time.time())
    }

    /// Source of the current calendar date.
    ///
    /// Expiry checks take the date from here instead of reading the clock themselves, so they
    /// stay pure and can be tested against a fixed date.
    pub trait DateSource: Send + Sync {
        /// The current date.
        fn today(&self) -> Date;
    }

    /// Reads the current date from the system clock in UTC.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemDateSource;

    impl DateSource for SystemDateSource {
        fn today(&self) -> Date {
            now().date()
        }
    }

    /// Always reports the same date.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FixedDateSource(Date);

    impl FixedDateSource {
        /// Wrap an existing date.
        pub fn new(date: Date) -> Self {
            Self(date)
        }

        /// Build the date from its calendar parts.
        pub fn from_calendar_date(
            year: i32,
            month: u8,
            day: u8,
        ) -> CustomResult<Self, ParsingError> {
            let month = Month::try_from(month).change_context(ParsingError)?;
            Date::from_calendar_date(year, month, day)
                .map(Self)
                .change_context(ParsingError)
                .attach_printable_lazy(|| format!("{year:04}-{month}-{day:02} is not a valid date"))
        }
    }

    impl DateSource for FixedDateSource {
        fn today(&self) -> Date {
            self.0
        }
    }

}
