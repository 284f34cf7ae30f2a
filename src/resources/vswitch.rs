//! `hetznerrobot_vswitch`: a vSwitch and, optionally, its server members.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{found, from_state, parse_number, to_state};
use crate::client::{RobotClient, VSwitch, VLAN_RANGE};
use crate::config::Timeouts;
use crate::error::ProviderError;
use crate::reconcile::diff_ids;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, Schema};
use crate::types::ImportedResource;

/// Resource type name.
pub const TYPE_NAME: &str = "hetznerrobot_vswitch";

const DEFAULT_CANCELLATION_DATE: &str = "now";

/// Resource schema.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Hetzner vSwitch")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::required_string().with_description("Name of the vSwitch."),
        )
        .with_attribute(
            "vlan",
            Attribute::new(AttributeType::Int64, AttributeFlags::optional_computed())
                .with_description(format!(
                    "VLAN id in {}..={}. A free one is picked when unset.",
                    VLAN_RANGE.start(),
                    VLAN_RANGE.end()
                )),
        )
        .with_attribute(
            "servers",
            Attribute::list(AttributeType::Int64, AttributeFlags::optional_computed())
                .with_description("Numbers of the servers attached to the vSwitch."),
        )
        .with_attribute(
            "cancellation_date",
            Attribute::optional_string()
                .with_description("Cancellation date used on delete, YYYY-MM-DD or now."),
        )
        .with_attribute(
            "incidents",
            Attribute::list(AttributeType::String, AttributeFlags::computed())
                .with_description("Servers that failed to connect."),
        )
}

/// Checks beyond the schema: VLAN range.
pub fn validate(config: &Value) -> Vec<Diagnostic> {
    match config.get("vlan").and_then(Value::as_i64) {
        Some(vlan) if !VLAN_RANGE.contains(&vlan) => vec![Diagnostic::error("Invalid VLAN")
            .with_detail(format!(
                "VLAN must be between {} and {}, got {}.",
                VLAN_RANGE.start(),
                VLAN_RANGE.end(),
                vlan
            ))
            .with_attribute("vlan")],
        _ => Vec::new(),
    }
}

/// State of a `hetznerrobot_vswitch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VSwitchState {
    /// vSwitch id.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// VLAN id.
    pub vlan: Option<i64>,
    /// Attached server numbers, ascending.
    pub servers: Option<Vec<i64>>,
    /// Date passed to Robot on delete.
    pub cancellation_date: Option<String>,
    /// One message per server whose attach failed.
    pub incidents: Option<Vec<String>>,
}

fn incident(number: i64) -> String {
    format!(
        "Server {} failed to connect. Please check in the Hetzner web interface.",
        number
    )
}

impl VSwitchState {
    fn from_remote(vswitch: &VSwitch, cancellation_date: Option<String>) -> Self {
        VSwitchState {
            id: Some(vswitch.id.to_string()),
            name: vswitch.name.clone(),
            vlan: Some(vswitch.vlan),
            servers: Some(vswitch.server_numbers()),
            cancellation_date,
            incidents: Some(vswitch.failed_servers().into_iter().map(incident).collect()),
        }
    }

    fn vswitch_id(&self) -> Result<i64, ProviderError> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidRequest("vSwitch state has no id".to_string()))?;
        parse_number("id", id)
    }
}

/// Pick a VLAN in [`VLAN_RANGE`] that is not in `used`.
pub fn pick_free_vlan<R: Rng + ?Sized>(used: &BTreeSet<i64>, rng: &mut R) -> Option<i64> {
    let free: Vec<i64> = VLAN_RANGE.filter(|vlan| !used.contains(vlan)).collect();
    free.choose(rng).copied()
}

async fn free_vlan(client: &RobotClient) -> Result<i64, ProviderError> {
    // Cancelled vSwitches keep their VLAN until the cancellation date.
    let used: BTreeSet<i64> = client
        .list_vswitches()
        .await?
        .iter()
        .map(|v| v.vlan)
        .collect();

    let vlan = pick_free_vlan(&used, &mut rand::thread_rng());
    vlan.ok_or_else(|| {
        ProviderError::FailedPrecondition(format!(
            "no free VLAN in [{}..{}], all are taken",
            VLAN_RANGE.start(),
            VLAN_RANGE.end()
        ))
    })
}

async fn fetch(
    client: &RobotClient,
    id: i64,
    cancellation_date: Option<String>,
) -> Result<Option<VSwitchState>, ProviderError> {
    match found(client.get_vswitch(id).await)? {
        Some(vswitch) if !vswitch.cancelled => {
            Ok(Some(VSwitchState::from_remote(&vswitch, cancellation_date)))
        },
        Some(_) => {
            tracing::info!(id, "vSwitch is cancelled");
            Ok(None)
        },
        None => Ok(None),
    }
}

async fn fetch_existing(
    client: &RobotClient,
    id: i64,
    cancellation_date: Option<String>,
) -> Result<Value, ProviderError> {
    let state = fetch(client, id, cancellation_date)
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("vSwitch {}", id)))?;
    to_state(&state)
}

/// Create the vSwitch, attach servers and wait until they settle.
pub async fn create(
    client: &RobotClient,
    timeouts: &Timeouts,
    planned: Value,
) -> Result<Value, ProviderError> {
    let state: VSwitchState = from_state(planned)?;
    let vlan = match state.vlan {
        Some(vlan) => vlan,
        None => free_vlan(client).await?,
    };

    let vswitch = client.create_vswitch(&state.name, vlan).await?;
    let servers = state.servers.unwrap_or_default();
    if !servers.is_empty() {
        client.add_vswitch_servers(vswitch.id, &servers).await?;
        client
            .wait_vswitch_ready(vswitch.id, &timeouts.vswitch)
            .await?;
    }

    fetch_existing(client, vswitch.id, state.cancellation_date).await
}

/// Refresh from Robot. Null when the vSwitch is gone or cancelled.
pub async fn read(client: &RobotClient, current: Value) -> Result<Value, ProviderError> {
    let state: VSwitchState = from_state(current)?;
    match fetch(client, state.vswitch_id()?, state.cancellation_date).await? {
        Some(remote) => to_state(&remote),
        None => Ok(Value::Null),
    }
}

/// Rename or re-VLAN, then reconcile server membership.
pub async fn update(
    client: &RobotClient,
    timeouts: &Timeouts,
    prior: Value,
    planned: Value,
) -> Result<Value, ProviderError> {
    let prior: VSwitchState = from_state(prior)?;
    let planned: VSwitchState = from_state(planned)?;
    let id = prior.vswitch_id()?;

    let vlan = planned
        .vlan
        .or(prior.vlan)
        .ok_or_else(|| ProviderError::InvalidRequest(format!("vSwitch {} has no VLAN", id)))?;
    let vlan_changed = prior.vlan != Some(vlan);
    if planned.name != prior.name || vlan_changed {
        client.update_vswitch(id, &planned.name, vlan).await?;
        if vlan_changed {
            client.wait_vswitch_ready(id, &timeouts.vswitch).await?;
        }
    }

    if let Some(wanted) = &planned.servers {
        let current = prior.servers.clone().unwrap_or_default();
        let diff = diff_ids(&current, wanted);
        if !diff.is_empty() {
            tracing::debug!(id, add = ?diff.to_add, remove = ?diff.to_remove, "Reconciling vSwitch servers");
            client.remove_vswitch_servers(id, &diff.to_remove).await?;
            client.add_vswitch_servers(id, &diff.to_add).await?;
            client.wait_vswitch_ready(id, &timeouts.vswitch).await?;
        }
    }

    fetch_existing(client, id, planned.cancellation_date).await
}

/// Cancel the vSwitch. A vSwitch that is already gone is not an error.
pub async fn delete(client: &RobotClient, current: Value) -> Result<(), ProviderError> {
    let state: VSwitchState = from_state(current)?;
    let id = state.vswitch_id()?;
    let date = state
        .cancellation_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_CANCELLATION_DATE);

    if found(client.delete_vswitch(id, date).await)?.is_none() {
        tracing::warn!(id, "vSwitch already deleted");
    }
    Ok(())
}

/// Import by vSwitch id.
pub async fn import(client: &RobotClient, id: &str) -> Result<Vec<ImportedResource>, ProviderError> {
    let id = parse_number("id", id)?;
    let state = fetch_existing(client, id, None).await?;
    Ok(vec![ImportedResource::new(TYPE_NAME, state)])
}
