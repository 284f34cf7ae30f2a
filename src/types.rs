//! Plain Rust types exchanged between the provider and the gRPC bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change, `None` when creating.
    pub before: Option<Value>,
    /// The value after the change, `None` when deleting.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// A change for an attribute that did not exist before.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: None,
            after: Some(value),
        }
    }

    /// A change for an attribute that goes away.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: Some(value),
            after: None,
        }
    }

    /// A change for an attribute whose value differs.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            path: path.into(),
            before: Some(before),
            after: Some(after),
        }
    }
}

fn encode_optional(value: Option<Value>) -> Vec<u8> {
    value
        .and_then(|v| serde_json::to_vec(&v).ok())
        .unwrap_or_default()
}

impl From<AttributeChange> for protocol::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            path: change.path,
            before: encode_optional(change.before),
            after: encode_optional(change.after),
        }
    }
}

/// The result of planning a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The state expected after apply. `Null` for a planned destroy.
    pub planned_state: Value,
    /// Attribute-level changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource has to be destroyed and recreated.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Whether the plan changes anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// A resource returned by `ImportResourceState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned by `GetMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider plans destroy operations.
    pub plan_destroy: bool,
}

/// The protocol version written in the handshake line.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix written to stdout on startup.
pub const HANDSHAKE_PREFIX: &str = "HEMMER_PROVIDER";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("vlan", json!(4000));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!(4000)));

        let removed = AttributeChange::removed("name", json!("lan"));
        assert_eq!(removed.before, Some(json!("lan")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("vlan", json!(4000), json!(4001));
        assert_eq!(modified.before, Some(json!(4000)));
        assert_eq!(modified.after, Some(json!(4001)));
    }

    #[test]
    fn test_attribute_change_to_proto() {
        let proto: protocol::AttributeChange =
            AttributeChange::modified("name", json!("old"), json!("new")).into();
        assert_eq!(proto.path, "name");
        assert_eq!(proto.before, br#""old""#.to_vec());
        assert_eq!(proto.after, br#""new""#.to_vec());

        let proto: protocol::AttributeChange = AttributeChange::added("id", json!("7")).into();
        assert!(proto.before.is_empty());
    }

    #[test]
    fn test_plan_result() {
        let plan = PlanResult {
            planned_state: json!({"id": "123"}),
            changes: Vec::new(),
            requires_replace: false,
        };
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("hetznerrobot_vswitch", json!({"id": "4321"}));
        assert_eq!(imported.resource_type, "hetznerrobot_vswitch");
        assert_eq!(imported.state["id"], "4321");
    }
}
