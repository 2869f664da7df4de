//!
//! Current environment related stuff.
//!

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Parent dir where Cargo.toml is stored
pub const CARGO_MANIFEST_DIR: &str = "CARGO_MANIFEST_DIR";
/// Env variable that sets Development/Sandbox/Production env
pub const RUN_ENV: &str = "RUN_ENV";
/// Prefix of environment variables that override configuration values
pub const CONFIG_ENV_PREFIX: &str = "CARD_PARAMS";

///
/// Current environment.
///
#[derive(
    Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Env {
    /// Development environment.
    #[default]
    Development,
    /// Sandbox environment.
    Sandbox,
    /// Production environment.
    Production,
}

impl Env {
    /// Name of the configuration file for this environment.
    pub const fn config_path(self) -> &'static str {
        match self {
            Self::Development => "development.toml",
            Self::Sandbox => "sandbox.toml",
            Self::Production => "production.toml",
        }
    }
}

/// Current environment. Read from `RUN_ENV`, falling back to Development in debug builds and
/// Production otherwise.
pub fn which() -> Env {
    #[cfg(debug_assertions)]
    let default_env = Env::Development;
    #[cfg(not(debug_assertions))]
    let default_env = Env::Production;

    std::env::var(RUN_ENV).map_or_else(|_| default_env, |v| v.parse().unwrap_or(default_env))
}

///
/// Base path to look for the `config/` directory.
///
/// Tests and binaries run from the crate directory, so when `CARGO_MANIFEST_DIR` is set the
/// workspace root is two levels above it. Otherwise the current directory is used.
///
pub fn workspace_path() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var(CARGO_MANIFEST_DIR) {
        let mut path = PathBuf::from(manifest_dir);
        path.pop();
        path.pop();
        path
    } else {
        PathBuf::from(".")
    }
}

/// Path of the configuration file for `environment`, unless one is given explicitly.
pub fn config_path(environment: Env, explicit_config_path: Option<PathBuf>) -> PathBuf {
    explicit_config_path.unwrap_or_else(|| {
        let mut config_path = workspace_path();
        config_path.push("config");
        config_path.push(environment.config_path());
        config_path
    })
}
