//! Validation settings, read with the `config` crate.
//!
//! Values come from `config/<environment>.toml` in the workspace (see [`sdk_env::which`]) and
//! can be overridden with `CARD_PARAMS__<SECTION>__<KEY>` environment variables.

use std::path::PathBuf;

use common_utils::errors::{ConfigurationError, CustomResult};
use error_stack::ResultExt;
use serde::Deserialize;

use crate::brand::BrandRules;

/// Settings of the card payment validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Switches of the validating constructor.
    pub validation: ValidationSettings,
    /// Brand rules. An empty table turns brand detection and brand checks off.
    pub brands: BrandRules,
}

/// Switches of the validating constructor.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ValidationSettings {
    /// Require card numbers to pass the Luhn checksum.
    pub luhn_check: bool,
    /// Require a security code.
    pub cvv_required: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            luhn_check: true,
            cvv_required: true,
        }
    }
}

impl Settings {
    /// Read settings of the current environment.
    pub fn new() -> CustomResult<Self, ConfigurationError> {
        Self::with_config_path(None)
    }

    /// Read settings from `explicit_config_path`, or from the file of the current environment.
    /// A missing file leaves the defaults in place.
    pub fn with_config_path(
        explicit_config_path: Option<PathBuf>,
    ) -> CustomResult<Self, ConfigurationError> {
        let config_path = sdk_env::config_path(sdk_env::which(), explicit_config_path);

        let config = config::Config::builder()
            .add_source(config::File::from(config_path.clone()).required(false))
            .add_source(
                config::Environment::with_prefix(sdk_env::CONFIG_ENV_PREFIX)
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()
            .change_context(ConfigurationError::LoadFailed)
            .attach_printable_lazy(|| format!("config file: {}", config_path.display()))?;

        Self::deserialize_config(config)
    }

    /// Read settings from TOML text. Environment variables are not consulted.
    pub fn from_toml(contents: &str) -> CustomResult<Self, ConfigurationError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()
            .change_context(ConfigurationError::LoadFailed)?;

        Self::deserialize_config(config)
    }

    fn deserialize_config(config: config::Config) -> CustomResult<Self, ConfigurationError> {
        config
            .try_deserialize()
            .change_context(ConfigurationError::InvalidValue {
                field_name: "card payment settings".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::BrandDetector;

    #[test]
    fn defaults_require_checksum_and_cvv() {
        let settings = Settings::default();

        assert!(settings.validation.luhn_check);
        assert!(settings.validation.cvv_required);
        assert!(settings.brands.is_empty());
    }

    #[test]
    fn settings_from_toml() {
        let settings = Settings::from_toml(
            r#"
[validation]
cvv_required = false

[brands.AMEX]
lengths = [15]
cvv_length = 4
pattern = "^3[47]"

[brands.visa]
lengths = [13, 16, 19]
cvv_length = 3
pattern = "^4"
"#,
        )
        .unwrap();

        assert_eq!(
            settings.validation,
            ValidationSettings {
                luhn_check: true,
                cvv_required: false,
            }
        );
        assert_eq!(settings.brands.len(), 2);
        assert_eq!(settings.brands.get("amex").unwrap().cvv_length(), 4);
        assert_eq!(settings.brands.detect_brand("4242424242424242"), Some("VISA"));
    }

    #[test]
    fn invalid_brand_pattern_is_reported() {
        let settings = Settings::from_toml(
            r#"
[brands.VISA]
lengths = [16]
cvv_length = 3
pattern = "^(4"
"#,
        );

        assert!(matches!(
            settings.unwrap_err().current_context(),
            ConfigurationError::InvalidValue { .. }
        ));
    }
}
