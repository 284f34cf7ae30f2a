//! `hetznerrobot_vswitch`: vSwitches on the account.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{data_source_id, parse_ids, requested_ids};
use crate::client::{RobotClient, VSwitch};
use crate::error::ProviderError;
use crate::resources::to_state;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// Data source type name.
pub const TYPE_NAME: &str = "hetznerrobot_vswitch";

/// Data source schema.
pub fn schema() -> Schema {
    let vswitch = AttributeType::object([
        ("id", AttributeType::String),
        ("name", AttributeType::String),
        ("vlan", AttributeType::Int64),
        ("cancelled", AttributeType::Bool),
    ]);

    Schema::v0()
        .with_description("vSwitches on the Robot account")
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "ids",
            Attribute::list(AttributeType::String, AttributeFlags::optional())
                .with_description("vSwitch ids to fetch. All vSwitches when unset."),
        )
        .with_attribute(
            "vswitches",
            Attribute::list(vswitch, AttributeFlags::computed()),
        )
}

/// One entry of `vswitches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VSwitchEntry {
    /// vSwitch id as a string.
    pub id: String,
    /// Display name.
    pub name: String,
    /// VLAN id.
    pub vlan: i64,
    /// Whether the vSwitch is cancelled.
    pub cancelled: bool,
}

impl From<VSwitch> for VSwitchEntry {
    fn from(vswitch: VSwitch) -> Self {
        VSwitchEntry {
            id: vswitch.id.to_string(),
            name: vswitch.name,
            vlan: vswitch.vlan,
            cancelled: vswitch.cancelled,
        }
    }
}

#[derive(Serialize)]
struct VSwitchesState {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<Vec<String>>,
    vswitches: Vec<VSwitchEntry>,
}

/// List all vSwitches, or the requested ones concurrently. An empty result
/// is an error.
pub async fn read(client: &RobotClient, config: Value) -> Result<Value, ProviderError> {
    let ids = requested_ids(&config);
    let vswitches = if ids.is_empty() {
        client.list_vswitches().await?
    } else {
        client.get_vswitches(&parse_ids(&ids)?).await?
    };

    if vswitches.is_empty() {
        return Err(ProviderError::NotFound("no vSwitches found".to_string()));
    }

    to_state(&VSwitchesState {
        id: data_source_id("vswitches", &ids),
        ids: config.get("ids").filter(|v| !v.is_null()).map(|_| ids.clone()),
        vswitches: vswitches.into_iter().map(VSwitchEntry::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_read_all() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vswitch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 4, "name": "lan", "vlan": 4000, "cancelled": false},
                {"id": 9, "name": "old", "vlan": 4001, "cancelled": true}
            ])))
            .mount(&mock)
            .await;

        let state = read(&test_client(&mock), json!({"ids": null}))
            .await
            .unwrap();
        assert_eq!(state["id"], "vswitches-all");
        assert_eq!(
            state["vswitches"][1],
            json!({"id": "9", "name": "old", "vlan": 4001, "cancelled": true})
        );
    }

    #[tokio::test]
    async fn test_read_by_ids() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vswitch/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 4, "name": "lan", "vlan": 4000, "cancelled": false,
                "server": [], "subnet": [], "cloud_network": []
            })))
            .mount(&mock)
            .await;

        let state = read(&test_client(&mock), json!({"ids": ["4"]}))
            .await
            .unwrap();
        assert_eq!(state["id"], "vswitches-4");
        assert_eq!(state["ids"], json!(["4"]));
        assert_eq!(state["vswitches"][0]["name"], "lan");
    }

    #[tokio::test]
    async fn test_empty_account_is_an_error() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vswitch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock)
            .await;

        let err = read(&test_client(&mock), json!({})).await.unwrap_err();
        assert_eq!(err.message(), "no vSwitches found");
    }
}
