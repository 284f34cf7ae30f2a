//! Dedicated server lookups and renames.

use serde::{Deserialize, Serialize};

use super::{nullable, Form, RobotClient, RobotError};
use crate::reconcile::{fetch_concurrently, MAX_CONCURRENT_FETCHES};

/// A dedicated server as reported by `GET /server`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Server {
    /// Main IPv4 address. Empty for IPv6-only servers.
    #[serde(default, deserialize_with = "nullable")]
    pub server_ip: String,
    /// Main IPv6 subnet.
    #[serde(default, deserialize_with = "nullable")]
    pub server_ipv6_net: String,
    /// Robot server number.
    pub server_number: i64,
    /// Display name set in Robot.
    #[serde(default, deserialize_with = "nullable")]
    pub server_name: String,
    /// Product name, e.g. `AX41`.
    #[serde(default, deserialize_with = "nullable")]
    pub product: String,
    /// Datacenter, e.g. `FSN1-DC14`.
    #[serde(default, deserialize_with = "nullable")]
    pub dc: String,
    /// Traffic allowance.
    #[serde(default, deserialize_with = "nullable")]
    pub traffic: String,
    /// `ready` or `in process`.
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    /// Whether the server has been cancelled.
    #[serde(default, deserialize_with = "nullable")]
    pub cancelled: bool,
    /// Paid-until date, `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "nullable")]
    pub paid_until: String,
}

#[derive(Deserialize)]
struct ServerEnvelope {
    server: Server,
}

impl RobotClient {
    /// List every server on the account.
    pub async fn list_servers(&self) -> Result<Vec<Server>, RobotError> {
        let envelopes: Vec<ServerEnvelope> = self.get_json("/server").await?;
        Ok(envelopes.into_iter().map(|e| e.server).collect())
    }

    /// Fetch a single server by number.
    pub async fn get_server(&self, number: i64) -> Result<Server, RobotError> {
        let envelope: ServerEnvelope = self.get_json(&format!("/server/{}", number)).await?;
        Ok(envelope.server)
    }

    /// Fetch several servers concurrently, sorted by server number.
    pub async fn get_servers(&self, numbers: &[i64]) -> Result<Vec<Server>, RobotError> {
        let mut servers = fetch_concurrently(
            numbers.iter().copied(),
            MAX_CONCURRENT_FETCHES,
            |number| self.get_server(number),
        )
        .await?;
        servers.sort_by_key(|s| s.server_number);
        Ok(servers)
    }

    /// Set the display name of a server.
    pub async fn rename_server(&self, number: i64, name: &str) -> Result<Server, RobotError> {
        let form: Form = vec![("server_name".to_string(), name.to_string())];
        let envelope: ServerEnvelope = self
            .post_form(&format!("/server/{}", number), &form)
            .await?;
        tracing::info!(server_number = number, name, "Renamed server");
        Ok(envelope.server)
    }
}
