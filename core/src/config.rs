//! Client configuration.
//!
//! The backend URL has no default: a client without one cannot do anything
//! useful, so a missing value is an error at startup rather than a guess.

use std::time::Duration;

use crate::error::ConfigError;

pub const BACKEND_URL_VAR: &str = "TODO_BACKEND_URL";
pub const TIMEOUT_VAR: &str = "TODO_TIMEOUT_SECS";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                name: BACKEND_URL_VAR,
                value: base_url.to_string(),
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from a variable source keyed by `TODO_BACKEND_URL` and
    /// `TODO_TIMEOUT_SECS`. The timeout must be a whole number of seconds,
    /// at least one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(BACKEND_URL_VAR).ok_or(ConfigError::MissingVar(BACKEND_URL_VAR))?;
        let config = Self::new(&url)?;
        match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        name: TIMEOUT_VAR,
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: TIMEOUT_VAR,
                        value: raw,
                        reason: "must be at least 1 second".to_string(),
                    });
                }
                Ok(config.with_timeout(Duration::from_secs(secs)))
            }
            None => Ok(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_url_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(BACKEND_URL_VAR)));
    }

    #[test]
    fn reads_url_and_default_timeout() {
        let config =
            ClientConfig::from_lookup(lookup(&[(BACKEND_URL_VAR, "http://127.0.0.1:5000/")]))
                .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn reads_timeout() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BACKEND_URL_VAR, "https://todos.example"),
            (TIMEOUT_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (BACKEND_URL_VAR, "http://localhost"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: TIMEOUT_VAR, .. }));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (BACKEND_URL_VAR, "http://localhost"),
            (TIMEOUT_VAR, "0"),
        ]))
        .unwrap_err();
        match err {
            ConfigError::InvalidValue { name, value, .. } => {
                assert_eq!(name, TIMEOUT_VAR);
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_http_url() {
        assert!(ClientConfig::new("localhost:5000").is_err());
    }
}
