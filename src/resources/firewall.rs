//! `hetznerrobot_firewall`: the stateless firewall of one dedicated server.
//!
//! The resource id is the server number. Robot addresses firewalls by the
//! server's main IP, so every operation resolves the server first.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_number, found, from_state, parse_number, to_state};
use crate::client::{Firewall, FirewallRule, FirewallRules, FirewallStatus, RobotClient};
use crate::config::Timeouts;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};
use crate::types::ImportedResource;

/// Resource type name.
pub const TYPE_NAME: &str = "hetznerrobot_firewall";

const ACTIONS: [&str; 2] = ["accept", "discard"];

/// Resource schema.
pub fn schema() -> Schema {
    let rule = Block::new()
        .with_description("Input rule, evaluated in order")
        .with_attribute(
            "name",
            Attribute::optional_string().with_description("Name of the rule."),
        )
        .with_attribute(
            "src_ip",
            Attribute::optional_string().with_description("Source IP address or CIDR."),
        )
        .with_attribute(
            "src_port",
            Attribute::optional_string().with_description("Source port or range."),
        )
        .with_attribute(
            "dst_ip",
            Attribute::optional_string().with_description("Destination IP address or CIDR."),
        )
        .with_attribute(
            "dst_port",
            Attribute::optional_string().with_description("Destination port or range."),
        )
        .with_attribute(
            "protocol",
            Attribute::optional_string().with_description("Protocol, e.g. tcp or udp."),
        )
        .with_attribute(
            "tcp_flags",
            Attribute::optional_string().with_description("TCP flags to match."),
        )
        .with_attribute(
            "action",
            Attribute::required_string().with_description("accept or discard."),
        );

    Schema::v0()
        .with_description("Firewall of a Hetzner dedicated server")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "server_id",
            Attribute::required_string()
                .with_force_new()
                .with_description("Number of the server the firewall belongs to."),
        )
        .with_attribute(
            "active",
            Attribute::required_bool().with_description("Whether the rules are enforced."),
        )
        .with_attribute(
            "whitelist_hos",
            Attribute::required_bool()
                .with_description("Whether Hetzner services bypass the rules."),
        )
        .with_block("rule", NestedBlock::list(rule).with_min_items(1))
}

/// Checks beyond the schema: numeric `server_id`, known rule actions.
pub fn validate(config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = check_number(config, "server_id").into_iter().collect();

    let rules = config
        .get("rule")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (i, rule) in rules.iter().enumerate() {
        if let Some(action) = rule.get("action").and_then(Value::as_str) {
            if !ACTIONS.contains(&action) {
                diagnostics.push(
                    Diagnostic::error("Invalid rule action")
                        .with_detail(format!(
                            "Expected one of {}, got '{}'.",
                            ACTIONS.join(", "),
                            action
                        ))
                        .with_attribute(format!("rule.{}.action", i)),
                );
            }
        }
    }
    diagnostics
}

/// A rule as stored in state. Absent matchers are omitted, not null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct RuleState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_flags: Option<String>,
    pub action: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl From<&RuleState> for FirewallRule {
    fn from(rule: &RuleState) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        FirewallRule {
            name: field(&rule.name),
            src_ip: field(&rule.src_ip),
            src_port: field(&rule.src_port),
            dst_ip: field(&rule.dst_ip),
            dst_port: field(&rule.dst_port),
            protocol: field(&rule.protocol),
            tcp_flags: field(&rule.tcp_flags),
            action: rule.action.clone(),
        }
    }
}

impl From<FirewallRule> for RuleState {
    fn from(rule: FirewallRule) -> Self {
        RuleState {
            name: non_empty(rule.name),
            src_ip: non_empty(rule.src_ip),
            src_port: non_empty(rule.src_port),
            dst_ip: non_empty(rule.dst_ip),
            dst_port: non_empty(rule.dst_port),
            protocol: non_empty(rule.protocol),
            tcp_flags: non_empty(rule.tcp_flags),
            action: rule.action,
        }
    }
}

/// State of a `hetznerrobot_firewall`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallState {
    /// Server number, once created.
    pub id: Option<String>,
    /// Server number.
    pub server_id: String,
    /// Whether the rules are enforced.
    pub active: bool,
    /// Whether Hetzner services bypass the rules.
    pub whitelist_hos: bool,
    /// Input rules in order.
    pub rule: Vec<RuleState>,
}

impl FirewallState {
    fn from_remote(server_id: &str, firewall: Firewall) -> Self {
        FirewallState {
            id: Some(server_id.to_string()),
            server_id: server_id.to_string(),
            active: firewall.status == FirewallStatus::Active,
            whitelist_hos: firewall.whitelist_hos,
            rule: firewall.rules.input.into_iter().map(RuleState::from).collect(),
        }
    }

    fn to_firewall(&self, ip: String) -> Firewall {
        Firewall {
            ip,
            whitelist_hos: self.whitelist_hos,
            status: FirewallStatus::from_active(self.active),
            rules: FirewallRules {
                input: self.rule.iter().map(FirewallRule::from).collect(),
            },
        }
    }
}

/// Firewall that lets everything in. Left behind on delete.
fn allow_all(ip: String) -> Firewall {
    Firewall {
        ip,
        whitelist_hos: false,
        status: FirewallStatus::Active,
        rules: FirewallRules {
            input: vec![FirewallRule {
                name: "Allow all".to_string(),
                action: "accept".to_string(),
                ..Default::default()
            }],
        },
    }
}

async fn fetch(client: &RobotClient, server_id: &str) -> Result<Option<FirewallState>, ProviderError> {
    let number = parse_number("server_id", server_id)?;
    let Some(server) = found(client.get_server(number).await)? else {
        return Ok(None);
    };
    let Some(firewall) = found(client.get_firewall(&server.server_ip).await)? else {
        return Ok(None);
    };
    Ok(Some(FirewallState::from_remote(server_id, firewall)))
}

async fn apply(
    client: &RobotClient,
    timeouts: &Timeouts,
    planned: Value,
) -> Result<Value, ProviderError> {
    let state: FirewallState = from_state(planned)?;
    let number = parse_number("server_id", &state.server_id)?;
    let server = client.get_server(number).await?;

    client
        .set_firewall(&state.to_firewall(server.server_ip), &timeouts.firewall)
        .await?;

    let current = fetch(client, &state.server_id).await?.ok_or_else(|| {
        ProviderError::NotFound(format!("firewall of server {}", state.server_id))
    })?;
    to_state(&current)
}

/// Apply the configured rules and wait for the requested status.
pub async fn create(
    client: &RobotClient,
    timeouts: &Timeouts,
    planned: Value,
) -> Result<Value, ProviderError> {
    apply(client, timeouts, planned).await
}

/// Read the rules back. Null when the server is gone.
pub async fn read(client: &RobotClient, current: Value) -> Result<Value, ProviderError> {
    let state: FirewallState = from_state(current)?;
    match fetch(client, &state.server_id).await? {
        Some(remote) => to_state(&remote),
        None => Ok(Value::Null),
    }
}

/// Robot replaces the whole configuration, so update is create.
pub async fn update(
    client: &RobotClient,
    timeouts: &Timeouts,
    planned: Value,
) -> Result<Value, ProviderError> {
    apply(client, timeouts, planned).await
}

/// Open the firewall up with a single accept rule.
pub async fn delete(
    client: &RobotClient,
    timeouts: &Timeouts,
    current: Value,
) -> Result<(), ProviderError> {
    let state: FirewallState = from_state(current)?;
    let number = parse_number("server_id", &state.server_id)?;
    let Some(server) = found(client.get_server(number).await)? else {
        tracing::warn!(server_number = number, "Server is gone, nothing to reset");
        return Ok(());
    };

    client
        .set_firewall(&allow_all(server.server_ip), &timeouts.firewall)
        .await?;
    Ok(())
}

/// Import by server number.
pub async fn import(client: &RobotClient, id: &str) -> Result<Vec<ImportedResource>, ProviderError> {
    let id = id.trim();
    let state = fetch(client, id)
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("firewall of server {}", id)))?;
    Ok(vec![ImportedResource::new(TYPE_NAME, to_state(&state)?)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use crate::resources::tests::{fast_timeouts, mount_server};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn firewall_body(status: &str) -> Value {
        json!({
            "firewall": {
                "server_ip": "10.0.0.7",
                "whitelist_hos": true,
                "status": status,
                "rules": {"input": [
                    {"ip_version": "ipv4", "name": "ssh", "src_ip": null, "dst_port": "22", "protocol": "tcp", "action": "accept"},
                    {"ip_version": "ipv4", "name": "", "action": "discard"}
                ]}
            }
        })
    }

    async fn mount_firewall(mock: &MockServer, status: &str) {
        Mock::given(method("GET"))
            .and(path("/firewall/10.0.0.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(firewall_body(status)))
            .mount(mock)
            .await;
    }

    #[test]
    fn test_validate_rule_actions() {
        let config = json!({
            "server_id": "7",
            "rule": [{"action": "accept"}, {"action": "drop"}]
        });
        let diagnostics = validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("rule.1.action"));

        let diagnostics = validate(&json!({"server_id": "seven", "rule": []}));
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("server_id"));
    }

    #[test]
    fn test_rule_state_omits_empty_matchers() {
        let rule = RuleState::from(FirewallRule {
            name: "web".to_string(),
            dst_port: "443".to_string(),
            action: "accept".to_string(),
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({"name": "web", "dst_port": "443", "action": "accept"})
        );
        assert_eq!(FirewallRule::from(&rule).src_ip, "");
    }

    #[tokio::test]
    async fn test_read_maps_remote_firewall() {
        let mock = MockServer::start().await;
        mount_server(&mock, 7, "10.0.0.7").await;
        mount_firewall(&mock, "active").await;

        let state = read(&test_client(&mock), json!({"id": "7", "server_id": "7"}))
            .await
            .unwrap();
        assert_eq!(state["id"], "7");
        assert_eq!(state["active"], true);
        assert_eq!(state["whitelist_hos"], true);
        assert_eq!(
            state["rule"],
            json!([
                {"name": "ssh", "dst_port": "22", "protocol": "tcp", "action": "accept"},
                {"action": "discard"}
            ])
        );
    }

    #[tokio::test]
    async fn test_read_missing_server_is_null() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/7"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"status": 404, "code": "SERVER_NOT_FOUND", "message": "Server not found"}
            })))
            .mount(&mock)
            .await;

        let state = read(&test_client(&mock), json!({"server_id": "7"}))
            .await
            .unwrap();
        assert!(state.is_null());
    }

    #[tokio::test]
    async fn test_create_disabled_waits_for_disabled() {
        let mock = MockServer::start().await;
        mount_server(&mock, 7, "10.0.0.7").await;
        Mock::given(method("POST"))
            .and(path("/firewall/10.0.0.7"))
            .and(body_string_contains("status=disabled"))
            .and(body_string_contains("rules%5Binput%5D%5B0%5D%5Baction%5D=accept"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock)
            .await;
        mount_firewall(&mock, "disabled").await;

        let state = create(
            &test_client(&mock),
            &fast_timeouts(),
            json!({
                "server_id": "7",
                "active": false,
                "whitelist_hos": true,
                "rule": [{"name": "ssh", "dst_port": "22", "protocol": "tcp", "action": "accept"}]
            }),
        )
        .await
        .unwrap();
        assert_eq!(state["active"], false);
        assert_eq!(state["id"], "7");
    }

    #[tokio::test]
    async fn test_delete_leaves_allow_all() {
        let mock = MockServer::start().await;
        mount_server(&mock, 7, "10.0.0.7").await;
        Mock::given(method("POST"))
            .and(path("/firewall/10.0.0.7"))
            .and(body_string_contains("whitelist_hos=false&status=active"))
            .and(body_string_contains("rules%5Binput%5D%5B0%5D%5Bname%5D=Allow+all"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock)
            .await;
        mount_firewall(&mock, "active").await;

        delete(
            &test_client(&mock),
            &fast_timeouts(),
            json!({"id": "7", "server_id": "7", "active": false, "whitelist_hos": true, "rule": []}),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_import_by_server_number() {
        let mock = MockServer::start().await;
        mount_server(&mock, 7, "10.0.0.7").await;
        mount_firewall(&mock, "disabled").await;

        let imported = import(&test_client(&mock), "7").await.unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].resource_type, TYPE_NAME);
        assert_eq!(imported[0].state["server_id"], "7");
        assert_eq!(imported[0].state["active"], false);

        let err = import(&test_client(&mock), "web").await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }
}
