//! Provider block configuration.
//!
//! Every attribute falls back to an environment variable when it is absent
//! or empty in the provider block.

use std::time::Duration;

use serde_json::Value;

use crate::client::{RobotConfig, DEFAULT_BASE_URL};
use crate::reconcile::{PortWait, WaitPolicy};
use crate::schema::{Attribute, Diagnostic, Schema};

/// Fallback for `username`.
pub const ENV_USERNAME: &str = "HETZNERROBOT_USERNAME";
/// Fallback for `password`.
pub const ENV_PASSWORD: &str = "HETZNERROBOT_PASSWORD";
/// Fallback for `url`.
pub const ENV_URL: &str = "HETZNERROBOT_URL";

/// Schema of the provider block.
pub fn provider_schema() -> Schema {
    Schema::v0()
        .with_description("Hetzner Robot webservice credentials")
        .with_attribute(
            "username",
            Attribute::optional_string().with_description(format!(
                "Robot webservice user. Falls back to {}.",
                ENV_USERNAME
            )),
        )
        .with_attribute(
            "password",
            Attribute::optional_string()
                .sensitive()
                .with_description(format!(
                    "Robot webservice password. Falls back to {}.",
                    ENV_PASSWORD
                )),
        )
        .with_attribute(
            "url",
            Attribute::optional_string().with_description(format!(
                "Robot webservice URL. Falls back to {}, then {}.",
                ENV_URL, DEFAULT_BASE_URL
            )),
        )
}

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Robot webservice user.
    pub username: String,
    /// Robot webservice password.
    pub password: String,
    /// Base URL without trailing slash.
    pub url: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve from the provider block and the process environment.
    pub fn resolve(config: &Value) -> Result<Self, Diagnostic> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve from the provider block, reading fallbacks through `env`.
    pub fn resolve_with<E>(config: &Value, env: E) -> Result<Self, Diagnostic>
    where
        E: Fn(&str) -> Option<String>,
    {
        let lookup = |attribute: &str, variable: &str| -> Option<String> {
            config
                .get(attribute)
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .or_else(|| env(variable).filter(|v| !v.is_empty()))
        };

        let (username, password) = match (
            lookup("username", ENV_USERNAME),
            lookup("password", ENV_PASSWORD),
        ) {
            (Some(username), Some(password)) => (username, password),
            (username, _) => {
                let attribute = if username.is_none() {
                    "username"
                } else {
                    "password"
                };
                return Err(Diagnostic::error("Missing credentials")
                    .with_detail("Both username and password must be provided.")
                    .with_attribute(attribute));
            },
        };

        let url = lookup("url", ENV_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            username,
            password,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Client configuration for these credentials.
    pub fn robot_config(&self) -> RobotConfig {
        RobotConfig::new(self.username.clone(), self.password.clone()).with_base_url(&self.url)
    }
}

/// Timing knobs for waits performed by the resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Firewall status transition.
    pub firewall: WaitPolicy,
    /// vSwitch attach/detach.
    pub vswitch: WaitPolicy,
    /// SSH reachability after booting into rescue.
    pub ssh: PortWait,
    /// Pause before powering on after a `power` reset.
    pub power_on_delay: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            firewall: WaitPolicy::default(),
            vswitch: WaitPolicy::default(),
            ssh: PortWait::default(),
            power_on_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_block_values_win() {
        let config = ProviderConfig::resolve_with(
            &json!({"username": "robot", "password": "secret", "url": "http://localhost:8080/"}),
            env_from(&[(ENV_USERNAME, "other"), (ENV_URL, "http://ignored")]),
        )
        .unwrap();
        assert_eq!(config.username, "robot");
        assert_eq!(config.password, "secret");
        assert_eq!(config.url, "http://localhost:8080");
    }

    #[test]
    fn test_env_fallback_and_default_url() {
        let config = ProviderConfig::resolve_with(
            &json!({"username": ""}),
            env_from(&[(ENV_USERNAME, "robot"), (ENV_PASSWORD, "secret")]),
        )
        .unwrap();
        assert_eq!(config.username, "robot");
        assert_eq!(config.url, DEFAULT_BASE_URL);
        assert_eq!(config.robot_config().base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_missing_credentials() {
        let err = ProviderConfig::resolve_with(&json!({"username": "robot"}), env_from(&[]))
            .unwrap_err();
        assert_eq!(err.summary, "Missing credentials");
        assert_eq!(
            err.detail.as_deref(),
            Some("Both username and password must be provided.")
        );
        assert_eq!(err.attribute.as_deref(), Some("password"));

        let err = ProviderConfig::resolve_with(&Value::Null, env_from(&[])).unwrap_err();
        assert_eq!(err.attribute.as_deref(), Some("username"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ProviderConfig::resolve_with(
            &json!({"username": "robot", "password": "hunter2"}),
            env_from(&[]),
        )
        .unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_schema_marks_password_sensitive() {
        let schema = provider_schema();
        assert!(schema.block.attributes["password"].flags.sensitive);
        assert!(!schema.block.attributes["username"].flags.required);
    }
}
