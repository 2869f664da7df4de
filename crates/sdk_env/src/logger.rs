//!
//! Logger of the card payment crates.
//!

#[doc(inline)]
pub use tracing::{debug, error, event as log, info, instrument, warn, Level};

pub mod config;
mod setup;

pub use self::{
    config::Config,
    setup::{setup, TelemetryGuard},
};
