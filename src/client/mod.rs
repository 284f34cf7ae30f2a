//! HTTP client for the Hetzner Robot webservice.
//!
//! Every request carries HTTP basic auth. Reads return JSON; writes are sent
//! as `application/x-www-form-urlencoded`, which is the only body encoding
//! Robot accepts.

mod boot;
mod firewall;
mod server;
mod vswitch;

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

pub use boot::{RescueActivation, ResetType};
pub use firewall::{Firewall, FirewallRule, FirewallRules, FirewallStatus};
pub use server::Server;
pub use vswitch::{
    VSwitch, VSwitchCloudNetwork, VSwitchServer, VSwitchServerStatus, VSwitchSubnet, VLAN_RANGE,
};

/// Production Robot webservice endpoint.
pub const DEFAULT_BASE_URL: &str = "https://robot-ws.your-server.de";

/// Form field pairs. Keys may repeat (`server[]`, `authorized_key[]`).
pub type Form = Vec<(String, String)>;

/// Robot client configuration.
#[derive(Clone)]
pub struct RobotConfig {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Robot webservice user.
    pub username: String,
    /// Robot webservice password.
    pub password: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Pause before powering a server back on after a `power` reset.
    pub power_on_delay: Duration,
}

impl RobotConfig {
    /// Configuration with default endpoint and timeouts.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(30),
            power_on_delay: Duration::from_secs(30),
        }
    }

    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the delay between a `power` reset and powering back on.
    pub fn with_power_on_delay(mut self, delay: Duration) -> Self {
        self.power_on_delay = delay;
        self
    }
}

impl fmt::Debug for RobotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobotConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("power_on_delay", &self.power_on_delay)
            .finish()
    }
}

/// HTTP client for the Robot API.
#[derive(Debug, Clone)]
pub struct RobotClient {
    client: Client,
    config: RobotConfig,
}

impl RobotClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::Init`] if the HTTP client cannot be built.
    pub fn new(config: RobotConfig) -> Result<Self, RobotError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .user_agent(concat!("hemmer-provider-hetznerrobot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RobotError::Init(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The client configuration.
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    async fn send(&self, method: Method, path: &str, form: Option<&Form>) -> Result<Response, RobotError> {
        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(%method, url, "Robot request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.config.username, Some(&self.config.password));
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RobotError::Request(format!("{} {}: {}", method, path, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let err = RobotError::from_response(status, &body);
        tracing::debug!(%method, path, status, error = %err, "Robot request failed");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RobotError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| RobotError::Request(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| RobotError::Parse(e.to_string()))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RobotError> {
        let response = self.send(Method::GET, path, None).await?;
        Self::decode(response).await
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &Form,
    ) -> Result<T, RobotError> {
        let response = self.send(Method::POST, path, Some(form)).await?;
        Self::decode(response).await
    }

    /// POST a form and ignore the response body.
    pub(crate) async fn post_form_unit(&self, path: &str, form: &Form) -> Result<(), RobotError> {
        self.send(Method::POST, path, Some(form)).await.map(drop)
    }

    pub(crate) async fn delete_form(&self, path: &str, form: &Form) -> Result<(), RobotError> {
        self.send(Method::DELETE, path, Some(form)).await.map(drop)
    }
}

/// Errors returned by [`RobotClient`].
#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// HTTP request failed before a response arrived
    #[error("request error: {0}")]
    Request(String),
    /// Robot answered with a non-success status
    #[error("Robot API error (status {status}, {code}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Robot error code, e.g. `SERVER_NOT_FOUND`
        code: String,
        /// Error message from Robot
        message: String,
    },
    /// Response parsing failed
    #[error("parse error: {0}")]
    Parse(String),
    /// A server-side transition did not finish in time
    #[error("timeout waiting for {0}")]
    Timeout(String),
    /// The caller passed something Robot cannot accept
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Several concurrent requests failed
    #[error("{}", summarize_errors(.errors))]
    Multiple {
        /// Every failure, in completion order
        errors: Vec<RobotError>,
    },
}

/// Number of failures spelled out in a [`RobotError::Multiple`] message.
const SUMMARY_LIMIT: usize = 5;

fn summarize_errors(errors: &[RobotError]) -> String {
    let shown = errors
        .iter()
        .take(SUMMARY_LIMIT)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    if errors.len() > SUMMARY_LIMIT {
        format!(
            "{} requests failed: {} (and {} more)",
            errors.len(),
            shown,
            errors.len() - SUMMARY_LIMIT
        )
    } else {
        format!("{} request(s) failed: {}", errors.len(), shown)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default, deserialize_with = "nullable")]
    code: String,
    #[serde(default, deserialize_with = "nullable")]
    message: String,
}

impl RobotError {
    /// Build an API error from a failed response.
    fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => RobotError::Api {
                status,
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => RobotError::Api {
                status,
                code: String::new(),
                message: body.trim().to_string(),
            },
        }
    }

    /// Whether Robot reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RobotError::Api { status: 404, .. })
    }
}

/// Deserialize `null` as the type's default value.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_client(server: &MockServer) -> RobotClient {
        RobotClient::new(
            RobotConfig::new("robot", "secret")
                .with_base_url(server.uri())
                .with_power_on_delay(Duration::ZERO),
        )
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = RobotConfig::new("robot", "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.power_on_delay, Duration::from_secs(30));

        let config = config.with_base_url("http://localhost:8080/");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_config_debug_redacts_password() {
        let debug = format!("{:?}", RobotConfig::new("robot", "hunter2"));
        assert!(debug.contains("robot"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_error_envelope_decoding() {
        let err = RobotError::from_response(
            404,
            r#"{"error":{"status":404,"code":"SERVER_NOT_FOUND","message":"Server not found"}}"#,
        );
        match &err {
            RobotError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(*status, 404);
                assert_eq!(code, "SERVER_NOT_FOUND");
                assert_eq!(message, "Server not found");
            },
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.is_not_found());

        let err = RobotError::from_response(502, "Bad Gateway\n");
        assert!(matches!(
            err,
            RobotError::Api { status: 502, ref message, .. } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_multiple_error_summary() {
        let errors = (1..=7)
            .map(|i| RobotError::Request(format!("boom {}", i)))
            .collect();
        let message = RobotError::Multiple { errors }.to_string();
        assert!(message.starts_with("7 requests failed"));
        assert!(message.contains("boom 5"));
        assert!(!message.contains("boom 6"));
        assert!(message.ends_with("(and 2 more)"));

        let message = RobotError::Multiple {
            errors: vec![RobotError::Timeout("vSwitch 1".to_string())],
        }
        .to_string();
        assert_eq!(message, "1 request(s) failed: timeout waiting for vSwitch 1");
    }

    #[tokio::test]
    async fn test_requests_use_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/321"))
            .and(basic_auth("robot", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "server": {"server_number": 321, "server_name": "web"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let found = client.get_server(321).await.unwrap();
        assert_eq!(found.server_number, 321);
    }

    #[tokio::test]
    async fn test_api_error_is_structured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/9"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"status": 401, "code": "UNAUTHORIZED", "message": "Unauthorized"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).get_server(9).await.unwrap_err();
        assert!(matches!(err, RobotError::Api { status: 401, ref code, .. } if code == "UNAUTHORIZED"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = test_client(&server).get_server(9).await.unwrap_err();
        assert!(matches!(err, RobotError::Parse(_)));
    }
}
