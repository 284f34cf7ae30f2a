//! Schema-driven planning.
//!
//! The planner only looks at the schema: defaults are filled in, computed
//! values survive from prior state, and changes to `force_new` attributes
//! mark the plan as a replacement.

use serde_json::{Map, Value};

use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};

/// Plan a resource from its prior state and the proposed configuration.
///
/// - `prior == None`: create
/// - `proposed == Null`: destroy
/// - otherwise: update or replace
pub fn plan_resource(schema: &Schema, prior: Option<&Value>, proposed: Value) -> PlanResult {
    match (prior, proposed) {
        (Some(prior), Value::Null) => plan_destroy(prior),
        (None, proposed) => plan_create(schema, proposed),
        (Some(prior), proposed) => plan_update(schema, prior, proposed),
    }
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn apply_defaults(schema: &Schema, planned: &mut Map<String, Value>) {
    for (name, attr) in &schema.block.attributes {
        if let Some(default) = &attr.default {
            if is_unset(planned.get(name)) {
                planned.insert(name.clone(), default.clone());
            }
        }
    }
}

fn plan_create(schema: &Schema, proposed: Value) -> PlanResult {
    let mut planned = as_object(proposed);
    apply_defaults(schema, &mut planned);

    let changes = planned
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| AttributeChange::added(k.clone(), v.clone()))
        .collect();

    PlanResult {
        planned_state: Value::Object(planned),
        changes,
        requires_replace: false,
    }
}

fn plan_update(schema: &Schema, prior: &Value, proposed: Value) -> PlanResult {
    let empty = Map::new();
    let prior = prior.as_object().unwrap_or(&empty);
    let mut planned = as_object(proposed);

    apply_defaults(schema, &mut planned);
    for (name, attr) in &schema.block.attributes {
        if attr.flags.computed && is_unset(planned.get(name)) {
            if let Some(value) = prior.get(name).filter(|v| !v.is_null()) {
                planned.insert(name.clone(), value.clone());
            }
        }
    }

    let mut changes = Vec::new();
    let mut requires_replace = false;
    let names = schema
        .block
        .attributes
        .keys()
        .chain(schema.block.blocks.keys());
    for name in names {
        let before = prior.get(name).filter(|v| !v.is_null());
        let after = planned.get(name).filter(|v| !v.is_null());
        let change = match (before, after) {
            (None, None) => continue,
            (Some(b), Some(a)) if b == a => continue,
            (None, Some(a)) => AttributeChange::added(name.clone(), a.clone()),
            (Some(b), None) => AttributeChange::removed(name.clone(), b.clone()),
            (Some(b), Some(a)) => AttributeChange::modified(name.clone(), b.clone(), a.clone()),
        };
        if schema
            .block
            .attributes
            .get(name)
            .is_some_and(|attr| attr.force_new)
        {
            requires_replace = true;
        }
        changes.push(change);
    }

    if requires_replace {
        // Provider-assigned values are recomputed by the replacement.
        for (name, attr) in &schema.block.attributes {
            if attr.is_computed_only() {
                planned.remove(name);
            }
        }
    }

    PlanResult {
        planned_state: Value::Object(planned),
        changes,
        requires_replace,
    }
}

fn plan_destroy(prior: &Value) -> PlanResult {
    let changes = prior
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| AttributeChange::removed(k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();

    PlanResult {
        planned_state: Value::Null,
        changes,
        requires_replace: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, AttributeType};
    use serde_json::json;

    fn rescue_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "server_number",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute("server_name", Attribute::required_string())
            .with_attribute(
                "rescue_os",
                Attribute::optional_string()
                    .with_force_new()
                    .with_default(json!("linux")),
            )
            .with_attribute("ip", Attribute::computed_string())
            .with_attribute(
                "vlan",
                Attribute::new(AttributeType::Int64, AttributeFlags::optional_computed()),
            )
    }

    fn prior() -> Value {
        json!({
            "id": "321",
            "server_number": "321",
            "server_name": "web",
            "rescue_os": "linux",
            "ip": "10.0.0.1",
            "vlan": 4000
        })
    }

    #[test]
    fn test_create_applies_defaults() {
        let plan = plan_resource(
            &rescue_schema(),
            None,
            json!({"server_number": "321", "server_name": "web"}),
        );
        assert_eq!(plan.planned_state["rescue_os"], "linux");
        assert_eq!(plan.changes.len(), 3);
        assert!(plan.changes.iter().all(|c| c.before.is_none()));
        assert!(!plan.requires_replace);
    }

    #[test]
    fn test_update_carries_computed_values() {
        let plan = plan_resource(
            &rescue_schema(),
            Some(&prior()),
            json!({"server_number": "321", "server_name": "db"}),
        );
        assert_eq!(plan.planned_state["id"], "321");
        assert_eq!(plan.planned_state["ip"], "10.0.0.1");
        assert_eq!(plan.planned_state["vlan"], 4000);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "server_name");
        assert!(!plan.requires_replace);
    }

    #[test]
    fn test_no_change() {
        let plan = plan_resource(
            &rescue_schema(),
            Some(&prior()),
            json!({"server_number": "321", "server_name": "web", "vlan": 4000}),
        );
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_force_new_requires_replace() {
        let plan = plan_resource(
            &rescue_schema(),
            Some(&prior()),
            json!({"server_number": "654", "server_name": "web"}),
        );
        assert!(plan.requires_replace);
        assert!(plan.planned_state.get("id").is_none());
        assert!(plan.planned_state.get("ip").is_none());
        assert_eq!(plan.planned_state["vlan"], 4000);
    }

    #[test]
    fn test_destroy_removes_everything() {
        let plan = plan_resource(&rescue_schema(), Some(&prior()), Value::Null);
        assert_eq!(plan.planned_state, Value::Null);
        assert_eq!(plan.changes.len(), 6);
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
    }
}
