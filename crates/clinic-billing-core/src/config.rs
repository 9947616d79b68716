//! Desk configuration.

use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PaymentMethod;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Product-level settings for the billing desk.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeskConfig {
    /// Prefix for displayed amounts
    pub currency_symbol: String,
    /// Method preselected on a blank form
    pub default_payment_method: PaymentMethod,
    /// Clear the form when a duplicate submission is rejected
    pub reset_form_on_duplicate: bool,
    /// Prefix for printed bill numbers
    pub reference_prefix: String,
    /// Label of the pending balance entry
    pub pending_description: String,
    /// Clinic's offset from UTC in minutes; decides which day a bill falls on
    pub utc_offset_minutes: i32,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "Rs.".into(),
            default_payment_method: PaymentMethod::Cash,
            reset_form_on_duplicate: false,
            reference_prefix: "BILL".into(),
            pending_description: "Pending Payment".into(),
            utc_offset_minutes: 0,
        }
    }
}

impl DeskConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: DeskConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The clinic's local offset. Falls back to UTC for an out-of-range value,
    /// which `from_json_str` never lets through.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.default_payment_method == PaymentMethod::None {
            return Err(ConfigError::Invalid(
                "default_payment_method must be Cash or Card".into(),
            ));
        }
        if self.reference_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("reference_prefix is empty".into()));
        }
        if self.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DeskConfig::default();
        assert_eq!(config.currency_symbol, "Rs.");
        assert_eq!(config.default_payment_method, PaymentMethod::Cash);
        assert!(!config.reset_form_on_duplicate);
        assert_eq!(config.utc_offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_utc_offset() {
        let config = DeskConfig::from_json_str(r#"{"utc_offset_minutes": 330}"#).unwrap();
        assert_eq!(config.utc_offset().local_minus_utc(), 330 * 60);

        let result = DeskConfig::from_json_str(r#"{"utc_offset_minutes": 1440}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        let result = DeskConfig::from_json_str(r#"{"utc_offset_minutes": -2147483648}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            DeskConfig::from_json_str(r#"{"reset_form_on_duplicate": true}"#).unwrap();
        assert!(config.reset_form_on_duplicate);
        assert_eq!(config.reference_prefix, "BILL");
    }

    #[test]
    fn test_rejects_none_default_method() {
        let result = DeskConfig::from_json_str(r#"{"default_payment_method": "None"}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"currency_symbol": "$", "default_payment_method": "Card"}}"#).unwrap();

        let config = DeskConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.default_payment_method, PaymentMethod::Card);
    }
}
