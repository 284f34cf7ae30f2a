//! `hetznerrobot_os_rescue`: boot a server into the rescue system.
//!
//! Creating the resource activates rescue, hard-resets the server, waits
//! for SSH and renames the server. Nothing is undone on delete.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{check_number, from_state, parse_number, to_state};
use crate::client::{ResetType, RobotClient};
use crate::config::Timeouts;
use crate::error::ProviderError;
use crate::reconcile::wait_for_port;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "hetznerrobot_os_rescue";

const DEFAULT_RESCUE_OS: &str = "linux";

/// Resource schema.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Rescue system boot of a Hetzner dedicated server")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "server_number",
            Attribute::required_string()
                .with_force_new()
                .with_description("Number of the server."),
        )
        .with_attribute(
            "server_name",
            Attribute::required_string().with_description("The server is renamed to this name."),
        )
        .with_attribute(
            "rescue_os",
            Attribute::optional_string()
                .with_force_new()
                .with_default(json!(DEFAULT_RESCUE_OS))
                .with_description("Rescue operating system, e.g. linux."),
        )
        .with_attribute(
            "ssh_keys",
            Attribute::list(AttributeType::String, AttributeFlags::optional())
                .with_force_new()
                .with_description("Fingerprints of stored SSH keys to authorize."),
        )
        .with_attribute(
            "ip",
            Attribute::computed_string().with_description("Main IPv4 address of the server."),
        )
        .with_attribute(
            "ssh_password",
            Attribute::computed_string()
                .sensitive()
                .with_description("Root password of the rescue system."),
        )
}

/// Checks beyond the schema: numeric `server_number`.
pub fn validate(config: &Value) -> Vec<Diagnostic> {
    check_number(config, "server_number").into_iter().collect()
}

/// State of a `hetznerrobot_os_rescue`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsRescueState {
    /// Server number, once created.
    pub id: Option<String>,
    /// Server number.
    pub server_number: String,
    /// Name given to the server.
    pub server_name: String,
    /// Rescue operating system.
    pub rescue_os: Option<String>,
    /// Authorized key fingerprints.
    pub ssh_keys: Option<Vec<String>>,
    /// Main IPv4 address.
    pub ip: Option<String>,
    /// Rescue root password.
    pub ssh_password: Option<String>,
}

impl std::fmt::Debug for OsRescueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsRescueState")
            .field("id", &self.id)
            .field("server_number", &self.server_number)
            .field("server_name", &self.server_name)
            .field("rescue_os", &self.rescue_os)
            .field("ssh_keys", &self.ssh_keys)
            .field("ip", &self.ip)
            .field("ssh_password", &self.ssh_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Activate rescue, reset, wait for SSH and rename.
pub async fn create(
    client: &RobotClient,
    timeouts: &Timeouts,
    planned: Value,
) -> Result<Value, ProviderError> {
    let mut state: OsRescueState = from_state(planned)?;
    let number = parse_number("server_number", &state.server_number)?;
    let os = state
        .rescue_os
        .get_or_insert_with(|| DEFAULT_RESCUE_OS.to_string())
        .clone();
    let keys = state.ssh_keys.clone().unwrap_or_default();

    let rescue = client.enable_rescue(number, &os, &keys).await?;
    if rescue.server_ip.is_empty() {
        return Err(ProviderError::FailedPrecondition(format!(
            "server {} has no IPv4 address to reach the rescue system on",
            number
        )));
    }

    client.reset_server(number, ResetType::Hardware).await?;
    wait_for_port(&rescue.server_ip, &timeouts.ssh).await?;
    client.rename_server(number, &state.server_name).await?;

    state.id = Some(state.server_number.clone());
    state.ip = Some(rescue.server_ip);
    state.ssh_password = Some(rescue.password);
    to_state(&state)
}

/// Rescue activation is one-shot, so the stored state stands.
pub async fn read(current: Value) -> Result<Value, ProviderError> {
    Ok(current)
}

/// Rename the server when its current name differs.
pub async fn update(client: &RobotClient, planned: Value) -> Result<Value, ProviderError> {
    let state: OsRescueState = from_state(planned)?;
    let number = parse_number("server_number", &state.server_number)?;

    let server = client.get_server(number).await?;
    if server.server_name != state.server_name {
        client.rename_server(number, &state.server_name).await?;
    } else {
        tracing::debug!(server_number = number, "Server name already up to date");
    }
    to_state(&state)
}

/// Nothing to undo: the server leaves rescue on its next reboot.
pub async fn delete(current: Value) -> Result<(), ProviderError> {
    let state: OsRescueState = from_state(current)?;
    tracing::debug!(server_number = %state.server_number, "Forgetting rescue activation");
    Ok(())
}
