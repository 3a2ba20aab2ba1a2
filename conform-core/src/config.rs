//! Environment configuration.
//!
//! Credentials, endpoint and defaults come from the environment; none of it
//! is core logic. Recognised variables:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `CONFORM_BACKEND_ID` | default backend (model) id |
//! | `CONFORM_API_KEY`, falling back to `OPENAI_API_KEY` | backend credential |
//! | `CONFORM_API_BASE` | OpenAI-compatible endpoint |
//! | `CONFORM_ORG_ID` | organization id |
//! | `CONFORM_MAX_RETRIES` | default total attempts |
//! | `CONFORM_BASE_DELAY_SECS` | default base backoff delay |
//! | `CONFORM_ATTEMPT_TIMEOUT_SECS` | per-attempt deadline |

use crate::error::ConformError;
use crate::retry::RetryPolicy;
use crate::types::DEFAULT_BACKEND_ID;
use std::str::FromStr;
use std::time::Duration;

/// Client configuration resolved from the environment.
#[derive(Clone)]
pub struct ClientConfig {
    pub default_backend_id: String,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub organization: Option<String>,
    pub retry: RetryPolicy,
    pub attempt_timeout: Option<Duration>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("default_backend_id", &self.default_backend_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("organization", &self.organization)
            .field("retry", &self.retry)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_backend_id: DEFAULT_BACKEND_ID.to_string(),
            api_key: None,
            api_base: None,
            organization: None,
            retry: RetryPolicy::default(),
            attempt_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConformError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConformError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let max_attempts = parse_var(&get, "CONFORM_MAX_RETRIES")?
            .unwrap_or(defaults.retry.max_attempts());
        let base_delay = parse_var::<f64>(&get, "CONFORM_BASE_DELAY_SECS")?
            .unwrap_or(defaults.retry.base_delay().as_secs_f64());
        let retry = RetryPolicy::from_seconds(max_attempts, base_delay)
            .map_err(|e| ConformError::configuration(e.to_string()))?;

        let attempt_timeout = parse_var::<f64>(&get, "CONFORM_ATTEMPT_TIMEOUT_SECS")?
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| {
                        ConformError::configuration(format!(
                            "CONFORM_ATTEMPT_TIMEOUT_SECS must be a positive number, got {secs}"
                        ))
                    })
            })
            .transpose()?;

        Ok(Self {
            default_backend_id: get("CONFORM_BACKEND_ID").unwrap_or(defaults.default_backend_id),
            api_key: get("CONFORM_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            api_base: get("CONFORM_API_BASE"),
            organization: get("CONFORM_ORG_ID"),
            retry,
            attempt_timeout,
        })
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConformError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| ConformError::configuration(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.default_backend_id, DEFAULT_BACKEND_ID);
        assert_eq!(config.api_key, None);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.attempt_timeout, None);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CONFORM_BACKEND_ID", "deepseek-chat"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("CONFORM_API_BASE", "https://api.deepseek.com/v1"),
            ("CONFORM_MAX_RETRIES", "5"),
            ("CONFORM_BASE_DELAY_SECS", "0.25"),
            ("CONFORM_ATTEMPT_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.default_backend_id, "deepseek-chat");
        assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));
        assert_eq!(config.api_base.as_deref(), Some("https://api.deepseek.com/v1"));
        assert_eq!(config.retry.max_attempts(), 5);
        assert_eq!(config.retry.base_delay(), Duration::from_millis(250));
        assert_eq!(config.attempt_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_conform_key_wins_over_openai_key() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CONFORM_API_KEY", "sk-primary"),
            ("OPENAI_API_KEY", "sk-fallback"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-primary"));
    }

    #[test]
    fn test_malformed_values_are_configuration_errors() {
        for vars in [
            [("CONFORM_MAX_RETRIES", "three")],
            [("CONFORM_MAX_RETRIES", "0")],
            [("CONFORM_BASE_DELAY_SECS", "-2")],
            [("CONFORM_ATTEMPT_TIMEOUT_SECS", "0")],
        ] {
            let err = ClientConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConformError::Configuration(_)), "{vars:?}: {err}");
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig {
            api_key: Some("sk-secret".into()),
            ..ClientConfig::default()
        };
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
