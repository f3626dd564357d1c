//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services as `Arc<CoreConfig>`. The intent is to avoid reading process-wide
//! environment variables during request handling, which can lead to
//! inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::DEFAULT_GENERATION_RETRY_CAP;
use crate::{CoreError, CoreResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    generation_retry_cap: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(generation_retry_cap: u32) -> CoreResult<Self> {
        if generation_retry_cap == 0 {
            return Err(CoreError::InvalidInput(
                "generation_retry_cap must be at least 1".into(),
            ));
        }
        Ok(Self {
            generation_retry_cap,
        })
    }

    pub fn generation_retry_cap(&self) -> u32 {
        self.generation_retry_cap
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            generation_retry_cap: DEFAULT_GENERATION_RETRY_CAP,
        }
    }
}

/// Parse the generation retry cap from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default cap.
pub fn generation_retry_cap_from_env_value(value: Option<String>) -> CoreResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(DEFAULT_GENERATION_RETRY_CAP),
        Some(v) => v.parse::<u32>().map_err(|e| {
            CoreError::InvalidInput(format!("invalid generation retry cap '{v}': {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_cap() {
        assert!(matches!(
            CoreConfig::new(0),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_env_value_defaults_when_unset_or_blank() {
        assert_eq!(
            generation_retry_cap_from_env_value(None).unwrap(),
            DEFAULT_GENERATION_RETRY_CAP
        );
        assert_eq!(
            generation_retry_cap_from_env_value(Some("   ".into())).unwrap(),
            DEFAULT_GENERATION_RETRY_CAP
        );
    }

    #[test]
    fn test_env_value_parses_number() {
        assert_eq!(
            generation_retry_cap_from_env_value(Some("4".into())).unwrap(),
            4
        );
        assert!(generation_retry_cap_from_env_value(Some("many".into())).is_err());
    }
}
