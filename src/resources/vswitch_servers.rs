//! `hetznerrobot_vswitch_servers`: server membership of an existing vSwitch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{found, from_state, to_state};
use crate::client::RobotClient;
use crate::config::Timeouts;
use crate::error::ProviderError;
use crate::reconcile::diff_ids;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "hetznerrobot_vswitch_servers";

/// Resource schema.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Servers attached to a Hetzner vSwitch")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "vswitch_id",
            Attribute::required_int64()
                .with_force_new()
                .with_description("Id of the vSwitch."),
        )
        .with_attribute(
            "servers",
            Attribute::list(AttributeType::Int64, AttributeFlags::required())
                .with_description("Numbers of the servers to attach."),
        )
}

/// Checks beyond the schema: positive vSwitch id.
pub fn validate(config: &Value) -> Vec<Diagnostic> {
    match config.get("vswitch_id").and_then(Value::as_i64) {
        Some(id) if id <= 0 => vec![Diagnostic::error("Invalid vSwitch id")
            .with_detail(format!("Expected a positive id, got {}.", id))
            .with_attribute("vswitch_id")],
        _ => Vec::new(),
    }
}

/// State of a `hetznerrobot_vswitch_servers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VSwitchServersState {
    /// The vSwitch id as a string.
    pub id: Option<String>,
    /// vSwitch id.
    pub vswitch_id: i64,
    /// Attached server numbers, ascending.
    pub servers: Vec<i64>,
}

async fn fetch(client: &RobotClient, vswitch_id: i64) -> Result<Option<VSwitchServersState>, ProviderError> {
    let vswitch = match found(client.get_vswitch(vswitch_id).await)? {
        Some(vswitch) if !vswitch.cancelled => vswitch,
        _ => return Ok(None),
    };
    Ok(Some(VSwitchServersState {
        id: Some(vswitch_id.to_string()),
        vswitch_id,
        servers: vswitch.server_numbers(),
    }))
}

async fn fetch_existing(client: &RobotClient, vswitch_id: i64) -> Result<Value, ProviderError> {
    let state = fetch(client, vswitch_id)
        .await?
        .ok_or_else(|| ProviderError::NotFound(format!("vSwitch {}", vswitch_id)))?;
    to_state(&state)
}

/// Attach the servers and wait until they settle.
pub async fn create(
    client: &RobotClient,
    timeouts: &Timeouts,
    planned: Value,
) -> Result<Value, ProviderError> {
    let state: VSwitchServersState = from_state(planned)?;
    let diff = diff_ids(&[], &state.servers);

    client
        .add_vswitch_servers(state.vswitch_id, &diff.to_add)
        .await?;
    client
        .wait_vswitch_ready(state.vswitch_id, &timeouts.vswitch)
        .await?;

    fetch_existing(client, state.vswitch_id).await
}

/// Every server currently attached. Null when the vSwitch is gone.
pub async fn read(client: &RobotClient, current: Value) -> Result<Value, ProviderError> {
    let state: VSwitchServersState = from_state(current)?;
    match fetch(client, state.vswitch_id).await? {
        Some(remote) => to_state(&remote),
        None => Ok(Value::Null),
    }
}

/// Detach removed servers, attach new ones, wait.
pub async fn update(
    client: &RobotClient,
    timeouts: &Timeouts,
    prior: Value,
    planned: Value,
) -> Result<Value, ProviderError> {
    let prior: VSwitchServersState = from_state(prior)?;
    let planned: VSwitchServersState = from_state(planned)?;
    let id = planned.vswitch_id;

    let diff = diff_ids(&prior.servers, &planned.servers);
    if !diff.is_empty() {
        client.remove_vswitch_servers(id, &diff.to_remove).await?;
        client.add_vswitch_servers(id, &diff.to_add).await?;
        client.wait_vswitch_ready(id, &timeouts.vswitch).await?;
    }

    fetch_existing(client, id).await
}

/// Detach the listed servers that are still attached.
pub async fn delete(
    client: &RobotClient,
    timeouts: &Timeouts,
    current: Value,
) -> Result<(), ProviderError> {
    let state: VSwitchServersState = from_state(current)?;
    let id = state.vswitch_id;
    let Some(remote) = fetch(client, id).await? else {
        tracing::warn!(id, "vSwitch is gone, nothing to detach");
        return Ok(());
    };

    let attached = diff_ids(&[], &remote.servers).to_add;
    let detach: Vec<i64> = diff_ids(&[], &state.servers)
        .to_add
        .into_iter()
        .filter(|n| attached.contains(n))
        .collect();
    if detach.is_empty() {
        return Ok(());
    }

    client.remove_vswitch_servers(id, &detach).await?;
    client.wait_vswitch_ready(id, &timeouts.vswitch).await?;
    Ok(())
}
