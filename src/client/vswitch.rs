//! vSwitches: VLANs spanning dedicated servers.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::{nullable, Form, RobotClient, RobotError};
use crate::reconcile::{fetch_concurrently, poll_until, WaitPolicy, MAX_CONCURRENT_FETCHES};

/// VLAN ids Robot accepts for vSwitches.
pub const VLAN_RANGE: RangeInclusive<i64> = 4000..=4091;

/// Connection status of a server inside a vSwitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VSwitchServerStatus {
    /// Attached and usable.
    Ready,
    /// Attach or detach still running.
    Processing,
    /// Attach failed.
    Failed,
    /// Missing or unrecognised.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A server attached to a vSwitch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VSwitchServer {
    /// Robot server number.
    pub server_number: i64,
    /// Main IPv4 address.
    #[serde(default, deserialize_with = "nullable")]
    pub server_ip: String,
    /// Main IPv6 subnet.
    #[serde(default, deserialize_with = "nullable")]
    pub server_ipv6_net: String,
    /// Connection status.
    #[serde(default, deserialize_with = "nullable")]
    pub status: VSwitchServerStatus,
}

/// A subnet routed into a vSwitch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct VSwitchSubnet {
    #[serde(default, deserialize_with = "nullable")]
    pub ip: String,
    #[serde(default, deserialize_with = "nullable")]
    pub mask: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub gateway: String,
}

/// A Hetzner Cloud network coupled to a vSwitch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct VSwitchCloudNetwork {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub ip: String,
    #[serde(default, deserialize_with = "nullable")]
    pub mask: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub gateway: String,
}

/// A vSwitch. The list endpoint omits the server, subnet and cloud network
/// arrays; they decode as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VSwitch {
    /// vSwitch id.
    pub id: i64,
    /// Display name.
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// VLAN id.
    pub vlan: i64,
    /// Whether the vSwitch has been cancelled.
    #[serde(default, deserialize_with = "nullable")]
    pub cancelled: bool,
    /// Attached servers.
    #[serde(rename = "server", default, deserialize_with = "nullable")]
    pub servers: Vec<VSwitchServer>,
    /// Routed subnets.
    #[serde(rename = "subnet", alias = "subnets", default, deserialize_with = "nullable")]
    pub subnets: Vec<VSwitchSubnet>,
    /// Coupled cloud networks.
    #[serde(
        rename = "cloud_network",
        alias = "cloud_networks",
        default,
        deserialize_with = "nullable"
    )]
    pub cloud_networks: Vec<VSwitchCloudNetwork>,
}

impl VSwitch {
    /// Whether no attached server is still `processing`.
    pub fn is_ready(&self) -> bool {
        !self
            .servers
            .iter()
            .any(|s| s.status == VSwitchServerStatus::Processing)
    }

    /// Attached server numbers, ascending.
    pub fn server_numbers(&self) -> Vec<i64> {
        let mut numbers: Vec<i64> = self.servers.iter().map(|s| s.server_number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    /// Numbers of servers whose attach failed, ascending.
    pub fn failed_servers(&self) -> Vec<i64> {
        let mut numbers: Vec<i64> = self
            .servers
            .iter()
            .filter(|s| s.status == VSwitchServerStatus::Failed)
            .map(|s| s.server_number)
            .collect();
        numbers.sort_unstable();
        numbers
    }
}

fn check_vlan(vlan: i64) -> Result<(), RobotError> {
    if VLAN_RANGE.contains(&vlan) {
        Ok(())
    } else {
        Err(RobotError::InvalidInput(format!(
            "VLAN {} is outside {}..={}",
            vlan,
            VLAN_RANGE.start(),
            VLAN_RANGE.end()
        )))
    }
}

fn name_vlan_form(name: &str, vlan: i64) -> Form {
    vec![
        ("name".to_string(), name.to_string()),
        ("vlan".to_string(), vlan.to_string()),
    ]
}

fn servers_form(numbers: &[i64]) -> Form {
    numbers
        .iter()
        .map(|n| ("server[]".to_string(), n.to_string()))
        .collect()
}

impl RobotClient {
    /// List every vSwitch on the account, cancelled ones included.
    pub async fn list_vswitches(&self) -> Result<Vec<VSwitch>, RobotError> {
        self.get_json("/vswitch").await
    }

    /// Fetch a vSwitch with its servers, subnets and cloud networks.
    pub async fn get_vswitch(&self, id: i64) -> Result<VSwitch, RobotError> {
        self.get_json(&format!("/vswitch/{}", id)).await
    }

    /// Fetch several vSwitches concurrently, sorted by id.
    pub async fn get_vswitches(&self, ids: &[i64]) -> Result<Vec<VSwitch>, RobotError> {
        let mut vswitches =
            fetch_concurrently(ids.iter().copied(), MAX_CONCURRENT_FETCHES, |id| {
                self.get_vswitch(id)
            })
            .await?;
        vswitches.sort_by_key(|v| v.id);
        Ok(vswitches)
    }

    /// Create a vSwitch.
    pub async fn create_vswitch(&self, name: &str, vlan: i64) -> Result<VSwitch, RobotError> {
        check_vlan(vlan)?;
        let vswitch: VSwitch = self
            .post_form("/vswitch", &name_vlan_form(name, vlan))
            .await?;
        tracing::info!(id = vswitch.id, name, vlan, "Created vSwitch");
        Ok(vswitch)
    }

    /// Change name and VLAN of a vSwitch.
    pub async fn update_vswitch(&self, id: i64, name: &str, vlan: i64) -> Result<(), RobotError> {
        check_vlan(vlan)?;
        self.post_form_unit(&format!("/vswitch/{}", id), &name_vlan_form(name, vlan))
            .await?;
        tracing::info!(id, name, vlan, "Updated vSwitch");
        Ok(())
    }

    /// Cancel a vSwitch. `cancellation_date` is `YYYY-MM-DD` or `now`.
    pub async fn delete_vswitch(&self, id: i64, cancellation_date: &str) -> Result<(), RobotError> {
        let form: Form = vec![(
            "cancellation_date".to_string(),
            cancellation_date.to_string(),
        )];
        self.delete_form(&format!("/vswitch/{}", id), &form).await?;
        tracing::info!(id, cancellation_date, "Cancelled vSwitch");
        Ok(())
    }

    /// Attach servers. An empty list sends nothing.
    pub async fn add_vswitch_servers(&self, id: i64, numbers: &[i64]) -> Result<(), RobotError> {
        if numbers.is_empty() {
            return Ok(());
        }
        self.post_form_unit(&format!("/vswitch/{}/server", id), &servers_form(numbers))
            .await?;
        tracing::info!(id, servers = ?numbers, "Attached servers to vSwitch");
        Ok(())
    }

    /// Detach servers. An empty list sends nothing.
    pub async fn remove_vswitch_servers(
        &self,
        id: i64,
        numbers: &[i64],
    ) -> Result<(), RobotError> {
        if numbers.is_empty() {
            return Ok(());
        }
        self.delete_form(&format!("/vswitch/{}/server", id), &servers_form(numbers))
            .await?;
        tracing::info!(id, servers = ?numbers, "Detached servers from vSwitch");
        Ok(())
    }

    /// Poll until no attached server is `processing`.
    pub async fn wait_vswitch_ready(
        &self,
        id: i64,
        policy: &WaitPolicy,
    ) -> Result<VSwitch, RobotError> {
        poll_until(
            policy,
            &format!("vSwitch {} to become ready", id),
            || self.get_vswitch(id),
            VSwitch::is_ready,
        )
        .await
    }
}
