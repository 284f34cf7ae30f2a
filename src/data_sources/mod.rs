//! Read-only data sources.
//!
//! Both data sources take an optional `ids` list of numeric strings. Without
//! ids everything on the account is listed; with ids the entities are
//! fetched concurrently.

pub mod server;
pub mod vswitch;

use serde_json::Value;

use crate::error::ProviderError;
use crate::reconcile::join_ids;
use crate::resources::parse_number;
use crate::schema::Diagnostic;

/// The `ids` argument as given, in order.
pub(crate) fn requested_ids(config: &Value) -> Vec<String> {
    config
        .get("ids")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse every requested id.
pub(crate) fn parse_ids(ids: &[String]) -> Result<Vec<i64>, ProviderError> {
    ids.iter().map(|id| parse_number("ids", id)).collect()
}

/// `<prefix>-all` without ids, `<prefix>-1-2-3` otherwise.
pub(crate) fn data_source_id(prefix: &str, ids: &[String]) -> String {
    if ids.is_empty() {
        format!("{}-all", prefix)
    } else {
        format!("{}-{}", prefix, join_ids(ids))
    }
}

/// One diagnostic per id that is not a number.
pub(crate) fn validate_ids(config: &Value) -> Vec<Diagnostic> {
    requested_ids(config)
        .iter()
        .enumerate()
        .filter(|(_, id)| id.trim().parse::<i64>().is_err())
        .map(|(i, id)| {
            Diagnostic::error("Invalid id")
                .with_detail(format!("Expected a number, got '{}'.", id))
                .with_attribute(format!("ids.{}", i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_source_id() {
        assert_eq!(data_source_id("servers", &[]), "servers-all");
        let ids = requested_ids(&json!({"ids": ["3", "1"]}));
        assert_eq!(data_source_id("servers", &ids), "servers-3-1");
    }

    #[test]
    fn test_parse_and_validate_ids() {
        let config = json!({"ids": ["12", "x"]});
        let diagnostics = validate_ids(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("ids.1"));
        assert!(parse_ids(&requested_ids(&config)).is_err());
        assert_eq!(parse_ids(&["7".to_string()]).unwrap(), vec![7]);
        assert!(requested_ids(&json!({})).is_empty());
    }
}
