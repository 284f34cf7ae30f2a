//! Per-server stateless firewall.

use serde::{Deserialize, Serialize};

use super::{nullable, Form, RobotClient, RobotError};
use crate::reconcile::{poll_until, WaitPolicy};

/// Firewall status as reported by Robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirewallStatus {
    /// Rules are enforced.
    Active,
    /// Rules are stored but not enforced.
    #[default]
    Disabled,
    /// A change is being rolled out.
    #[serde(rename = "in process")]
    InProcess,
    /// Anything this client does not know about.
    #[serde(other)]
    Unknown,
}

impl FirewallStatus {
    /// The value Robot expects in the `status` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallStatus::Active => "active",
            FirewallStatus::Disabled => "disabled",
            FirewallStatus::InProcess => "in process",
            FirewallStatus::Unknown => "unknown",
        }
    }

    /// `active` when `true`, `disabled` otherwise.
    pub fn from_active(active: bool) -> Self {
        if active {
            FirewallStatus::Active
        } else {
            FirewallStatus::Disabled
        }
    }
}

/// A single input rule. Empty or absent matchers match everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Rule name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Source address or CIDR.
    #[serde(default, deserialize_with = "nullable")]
    pub src_ip: String,
    /// Source port or `from-to` range.
    #[serde(default, deserialize_with = "nullable")]
    pub src_port: String,
    /// Destination address or CIDR.
    #[serde(default, deserialize_with = "nullable")]
    pub dst_ip: String,
    /// Destination port or `from-to` range.
    #[serde(default, deserialize_with = "nullable")]
    pub dst_port: String,
    /// `tcp`, `udp`, `icmp`, ...
    #[serde(default, deserialize_with = "nullable")]
    pub protocol: String,
    /// TCP flags, e.g. `syn|fin`.
    #[serde(default, deserialize_with = "nullable")]
    pub tcp_flags: String,
    /// `accept` or `discard`.
    pub action: String,
}

/// Rule chains of a firewall. Only the input chain is managed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FirewallRules {
    /// Incoming traffic rules, evaluated in order.
    #[serde(default, deserialize_with = "nullable")]
    pub input: Vec<FirewallRule>,
}

/// Firewall configuration of one server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Firewall {
    /// Main IP of the server the firewall belongs to.
    #[serde(rename = "server_ip", alias = "ip")]
    pub ip: String,
    /// Whether Hetzner services bypass the rules.
    #[serde(default, deserialize_with = "nullable")]
    pub whitelist_hos: bool,
    /// Current status.
    #[serde(default)]
    pub status: FirewallStatus,
    /// Rule chains.
    #[serde(default)]
    pub rules: FirewallRules,
}

impl Firewall {
    /// Encode as the form body of `POST /firewall/{ip}`.
    ///
    /// Every rule is sent as IPv4. Empty matchers are omitted.
    pub fn to_form(&self) -> Form {
        let mut form: Form = vec![
            ("whitelist_hos".to_string(), self.whitelist_hos.to_string()),
            ("status".to_string(), self.status.as_str().to_string()),
        ];

        for (idx, rule) in self.rules.input.iter().enumerate() {
            let key = |field: &str| format!("rules[input][{}][{}]", idx, field);
            form.push((key("ip_version"), "ipv4".to_string()));
            for (field, value) in [
                ("name", &rule.name),
                ("src_ip", &rule.src_ip),
                ("src_port", &rule.src_port),
                ("dst_ip", &rule.dst_ip),
                ("dst_port", &rule.dst_port),
                ("protocol", &rule.protocol),
                ("tcp_flags", &rule.tcp_flags),
            ] {
                if !value.is_empty() {
                    form.push((key(field), value.clone()));
                }
            }
            form.push((key("action"), rule.action.clone()));
        }
        form
    }
}

#[derive(Deserialize)]
struct FirewallEnvelope {
    firewall: Firewall,
}

impl RobotClient {
    /// Fetch the firewall of the server with the given main IP.
    pub async fn get_firewall(&self, ip: &str) -> Result<Firewall, RobotError> {
        let envelope: FirewallEnvelope = self.get_json(&format!("/firewall/{}", ip)).await?;
        Ok(envelope.firewall)
    }

    /// Replace the firewall configuration, then wait until Robot reports the
    /// requested status.
    pub async fn set_firewall(
        &self,
        firewall: &Firewall,
        policy: &WaitPolicy,
    ) -> Result<Firewall, RobotError> {
        if firewall.ip.is_empty() {
            return Err(RobotError::InvalidInput(
                "firewall server IP is empty".to_string(),
            ));
        }

        let path = format!("/firewall/{}", firewall.ip);
        self.post_form_unit(&path, &firewall.to_form()).await?;
        tracing::info!(
            ip = %firewall.ip,
            status = firewall.status.as_str(),
            rules = firewall.rules.input.len(),
            "Submitted firewall configuration"
        );

        let wanted = firewall.status;
        poll_until(
            policy,
            &format!("firewall {} to become {}", firewall.ip, wanted.as_str()),
            || self.get_firewall(&firewall.ip),
            |current| current.status == wanted,
        )
        .await
    }
}
