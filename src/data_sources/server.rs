//! `hetznerrobot_server`: dedicated servers on the account.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{data_source_id, parse_ids, requested_ids};
use crate::client::{RobotClient, Server};
use crate::error::ProviderError;
use crate::resources::to_state;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// Data source type name.
pub const TYPE_NAME: &str = "hetznerrobot_server";

/// Data source schema.
pub fn schema() -> Schema {
    let server = AttributeType::object([
        ("ip", AttributeType::String),
        ("ipv6_net", AttributeType::String),
        ("number", AttributeType::Int64),
        ("name", AttributeType::String),
        ("product", AttributeType::String),
        ("datacenter", AttributeType::String),
        ("traffic", AttributeType::String),
        ("status", AttributeType::String),
        ("cancelled", AttributeType::Bool),
        ("paid_until", AttributeType::String),
    ]);

    Schema::v0()
        .with_description("Dedicated servers on the Robot account")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "ids",
            Attribute::list(AttributeType::String, AttributeFlags::optional())
                .with_description("Server numbers to fetch. All servers when unset."),
        )
        .with_attribute(
            "servers",
            Attribute::list(server, AttributeFlags::computed()),
        )
}

/// One entry of `servers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ServerEntry {
    pub ip: String,
    pub ipv6_net: String,
    pub number: i64,
    pub name: String,
    pub product: String,
    pub datacenter: String,
    pub traffic: String,
    pub status: String,
    pub cancelled: bool,
    pub paid_until: String,
}

impl From<Server> for ServerEntry {
    fn from(server: Server) -> Self {
        ServerEntry {
            ip: server.server_ip,
            ipv6_net: server.server_ipv6_net,
            number: server.server_number,
            name: server.server_name,
            product: server.product,
            datacenter: server.dc,
            traffic: server.traffic,
            status: server.status,
            cancelled: server.cancelled,
            paid_until: server.paid_until,
        }
    }
}

#[derive(Serialize)]
struct ServersState {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<Vec<String>>,
    servers: Vec<ServerEntry>,
}

/// List all servers, or the requested ones concurrently.
pub async fn read(client: &RobotClient, config: Value) -> Result<Value, ProviderError> {
    let ids = requested_ids(&config);
    let servers = if ids.is_empty() {
        client.list_servers().await?
    } else {
        client.get_servers(&parse_ids(&ids)?).await?
    };
    tracing::debug!(count = servers.len(), "Read servers");

    to_state(&ServersState {
        id: data_source_id("servers", &ids),
        ids: config.get("ids").filter(|v| !v.is_null()).map(|_| ids.clone()),
        servers: servers.into_iter().map(ServerEntry::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_body(number: i64) -> Value {
        json!({
            "server": {
                "server_ip": format!("10.0.0.{}", number),
                "server_ipv6_net": "2a01:4f8::",
                "server_number": number,
                "server_name": format!("node-{}", number),
                "product": "AX41",
                "dc": "FSN1-DC14",
                "traffic": "unlimited",
                "status": "ready",
                "cancelled": false,
                "paid_until": "2026-12-31"
            }
        })
    }

    #[tokio::test]
    async fn test_read_all() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([server_body(1), server_body(2)])),
            )
            .mount(&mock)
            .await;

        let state = read(&test_client(&mock), json!({})).await.unwrap();
        assert_eq!(state["id"], "servers-all");
        assert_eq!(state["servers"][1]["name"], "node-2");
        assert_eq!(state["servers"][0]["datacenter"], "FSN1-DC14");
        assert!(state.get("ids").is_none());
    }

    #[tokio::test]
    async fn test_read_by_ids_sorted() {
        let mock = MockServer::start().await;
        for number in [5, 3] {
            Mock::given(method("GET"))
                .and(path(format!("/server/{}", number)))
                .respond_with(ResponseTemplate::new(200).set_body_json(server_body(number)))
                .mount(&mock)
                .await;
        }

        let state = read(&test_client(&mock), json!({"ids": ["5", "3"]}))
            .await
            .unwrap();
        assert_eq!(state["id"], "servers-5-3");
        assert_eq!(state["servers"][0]["number"], 3);
        assert_eq!(state["servers"][1]["ip"], "10.0.0.5");
    }

    #[tokio::test]
    async fn test_read_reports_every_failure() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/server/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(server_body(5)))
            .mount(&mock)
            .await;
        for number in [6, 7] {
            Mock::given(method("GET"))
                .and(path(format!("/server/{}", number)))
                .respond_with(ResponseTemplate::new(404))
                .mount(&mock)
                .await;
        }

        let err = read(&test_client(&mock), json!({"ids": ["5", "6", "7"]}))
            .await
            .unwrap_err();
        assert!(err.message().starts_with("2 request(s) failed"));
    }
}
