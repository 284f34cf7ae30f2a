//! Managed resources.
//!
//! Each submodule owns one resource type: its schema, configuration checks
//! the schema cannot express, and the create/read/update/delete operations
//! against [`RobotClient`](crate::client::RobotClient). State travels as
//! JSON and is decoded into a typed struct per resource.

pub mod firewall;
pub mod os_rescue;
pub mod vswitch;
pub mod vswitch_servers;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::RobotError;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

/// Decode a state or configuration value.
pub(crate) fn from_state<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(value)?)
}

/// Encode a typed state.
pub(crate) fn to_state<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// Parse a numeric identifier held as a string.
pub(crate) fn parse_number(attribute: &str, value: &str) -> Result<i64, ProviderError> {
    value.trim().parse::<i64>().map_err(|_| {
        ProviderError::Validation(format!(
            "{} must be a number, got '{}'",
            attribute, value
        ))
    })
}

/// `Ok(None)` when Robot answered 404.
pub(crate) fn found<T>(result: Result<T, RobotError>) -> Result<Option<T>, ProviderError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Diagnostic for a string attribute that must hold a number.
pub(crate) fn check_number(config: &Value, attribute: &str) -> Option<Diagnostic> {
    let value = config.get(attribute)?.as_str()?;
    match value.trim().parse::<i64>() {
        Ok(_) => None,
        Err(_) => Some(
            Diagnostic::error(format!("Invalid {}", attribute))
                .with_detail(format!("Expected a server number, got '{}'.", value))
                .with_attribute(attribute),
        ),
    }
}

/// Bring a proposed state into the shape `read` produces, so equal
/// configurations plan as no change.
///
/// - lists of server numbers are sorted and deduplicated
/// - null and empty-string fields inside nested block items are dropped
pub fn normalize_proposed(schema: &Schema, proposed: &mut Value) {
    let Some(object) = proposed.as_object_mut() else {
        return;
    };

    if let Some(Value::Array(servers)) = object.get_mut("servers") {
        let mut numbers: Vec<i64> = servers.iter().filter_map(Value::as_i64).collect();
        if numbers.len() == servers.len() {
            numbers.sort_unstable();
            numbers.dedup();
            *servers = numbers.into_iter().map(Value::from).collect();
        }
    }

    for name in schema.block.blocks.keys() {
        if let Some(Value::Array(items)) = object.get_mut(name) {
            for item in items.iter_mut() {
                if let Some(fields) = item.as_object_mut() {
                    fields.retain(|_, v| match v {
                        Value::Null => false,
                        Value::String(s) => !s.is_empty(),
                        _ => true,
                    });
                }
            }
        }
    }
}
