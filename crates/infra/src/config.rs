//! Environment-driven configuration for the infra layer.
//!
//! - `SHELFKIT_TODAY`: `YYYY-MM-DD`, pins the date used for window checks
//! - `SHELFKIT_AVAILABILITY_TYPES`: comma-separated built-in codes to
//!   register (default: all)

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use shelfkit_availability::{AvailabilityKind, AvailabilityTypeRegistry, Clock, FixedClock, SystemClock};

pub const TODAY_VAR: &str = "SHELFKIT_TODAY";
pub const AVAILABILITY_TYPES_VAR: &str = "SHELFKIT_AVAILABILITY_TYPES";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { var: &'static str, value: String },

    #[error("{var}: unknown availability type code '{code}'")]
    UnknownTypeCode { var: &'static str, code: String },

    #[error("{var}: no availability types listed")]
    NoTypes { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraConfig {
    pub today: Option<NaiveDate>,
    pub availability_types: Vec<AvailabilityKind>,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            today: None,
            availability_types: AvailabilityKind::ALL.to_vec(),
        }
    }
}

impl InfraConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = non_blank(lookup(TODAY_VAR)) {
            let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
                var: TODAY_VAR,
                value: value.clone(),
            })?;
            config.today = Some(date);
        }

        if let Some(value) = non_blank(lookup(AVAILABILITY_TYPES_VAR)) {
            let mut kinds = Vec::new();
            for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                let kind = AvailabilityKind::from_code(code).ok_or_else(|| ConfigError::UnknownTypeCode {
                    var: AVAILABILITY_TYPES_VAR,
                    code: code.to_string(),
                })?;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            if kinds.is_empty() {
                return Err(ConfigError::NoTypes {
                    var: AVAILABILITY_TYPES_VAR,
                });
            }
            config.availability_types = kinds;
        }

        Ok(config)
    }

    /// The pinned date if configured, otherwise the local wall clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.today {
            Some(date) => Arc::new(FixedClock(date)),
            None => Arc::new(SystemClock),
        }
    }

    pub fn registry(&self) -> AvailabilityTypeRegistry {
        AvailabilityTypeRegistry::with_kinds(self.availability_types.iter().copied())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(|v| v.trim().to_string())
}
