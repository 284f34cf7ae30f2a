//! The Hetzner Robot provider.
//!
//! [`HetznerRobotProvider`] implements [`ProviderService`] by dispatching on
//! the resource or data source type name. The Robot client is built by
//! `configure` and shared by every later call.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::client::RobotClient;
use crate::config::{provider_schema, ProviderConfig, Timeouts};
use crate::data_sources;
use crate::error::ProviderError;
use crate::plan::plan_resource;
use crate::resources::{firewall, normalize_proposed, os_rescue, vswitch, vswitch_servers};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;

/// Provider for Hetzner Robot dedicated servers.
pub struct HetznerRobotProvider {
    client: RwLock<Option<Arc<RobotClient>>>,
    timeouts: Timeouts,
}

impl Default for HetznerRobotProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HetznerRobotProvider {
    /// An unconfigured provider with the default waits.
    pub fn new() -> Self {
        Self::with_timeouts(Timeouts::default())
    }

    /// An unconfigured provider with custom waits.
    pub fn with_timeouts(timeouts: Timeouts) -> Self {
        Self {
            client: RwLock::new(None),
            timeouts,
        }
    }

    /// The waits used by resource operations.
    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    async fn client(&self) -> Result<Arc<RobotClient>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration(
                "provider is not configured, call configure first".to_string(),
            )
        })
    }

    fn resource_schema(resource_type: &str) -> Result<Schema, ProviderError> {
        match resource_type {
            firewall::TYPE_NAME => Ok(firewall::schema()),
            os_rescue::TYPE_NAME => Ok(os_rescue::schema()),
            vswitch::TYPE_NAME => Ok(vswitch::schema()),
            vswitch_servers::TYPE_NAME => Ok(vswitch_servers::schema()),
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    fn data_source_schema(data_source_type: &str) -> Result<Schema, ProviderError> {
        match data_source_type {
            data_sources::server::TYPE_NAME => Ok(data_sources::server::schema()),
            data_sources::vswitch::TYPE_NAME => Ok(data_sources::vswitch::schema()),
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl ProviderService for HetznerRobotProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(provider_schema())
            .with_resource(firewall::TYPE_NAME, firewall::schema())
            .with_resource(os_rescue::TYPE_NAME, os_rescue::schema())
            .with_resource(vswitch::TYPE_NAME, vswitch::schema())
            .with_resource(vswitch_servers::TYPE_NAME, vswitch_servers::schema())
            .with_data_source(
                data_sources::server::TYPE_NAME,
                data_sources::server::schema(),
            )
            .with_data_source(
                data_sources::vswitch::TYPE_NAME,
                data_sources::vswitch::schema(),
            )
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validate(&provider_schema(), &config);
        if diagnostics.is_empty() {
            if let Err(diagnostic) = ProviderConfig::resolve(&config) {
                diagnostics.push(diagnostic);
            }
        }
        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let resolved = match ProviderConfig::resolve(&config) {
            Ok(resolved) => resolved,
            Err(diagnostic) => return Ok(vec![diagnostic]),
        };

        let robot_config = resolved
            .robot_config()
            .with_power_on_delay(self.timeouts.power_on_delay);
        let client = RobotClient::new(robot_config)?;
        *self.client.write().await = Some(Arc::new(client));

        tracing::info!(url = %resolved.url, username = %resolved.username, "Configured Robot client");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        tracing::debug!("Dropped Robot client");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = Self::resource_schema(resource_type)?;
        let mut diagnostics = validate(&schema, &config);
        diagnostics.extend(match resource_type {
            firewall::TYPE_NAME => firewall::validate(&config),
            os_rescue::TYPE_NAME => os_rescue::validate(&config),
            vswitch::TYPE_NAME => vswitch::validate(&config),
            vswitch_servers::TYPE_NAME => vswitch_servers::validate(&config),
            _ => Vec::new(),
        });
        Ok(diagnostics)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        mut proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = Self::resource_schema(resource_type)?;
        normalize_proposed(&schema, &mut proposed_state);
        let prior_state = prior_state.filter(|v| !v.is_null());
        Ok(plan_resource(&schema, prior_state.as_ref(), proposed_state))
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        let timeouts = &self.timeouts;
        let state = match resource_type {
            firewall::TYPE_NAME => firewall::create(&client, timeouts, planned_state).await?,
            os_rescue::TYPE_NAME => os_rescue::create(&client, timeouts, planned_state).await?,
            vswitch::TYPE_NAME => vswitch::create(&client, timeouts, planned_state).await?,
            vswitch_servers::TYPE_NAME => {
                vswitch_servers::create(&client, timeouts, planned_state).await?
            },
            other => return Err(ProviderError::UnknownResource(other.to_string())),
        };
        tracing::info!(resource_type, id = ?state.get("id"), "Created resource");
        Ok(state)
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        let state = match resource_type {
            firewall::TYPE_NAME => firewall::read(&client, current_state).await?,
            os_rescue::TYPE_NAME => os_rescue::read(current_state).await?,
            vswitch::TYPE_NAME => vswitch::read(&client, current_state).await?,
            vswitch_servers::TYPE_NAME => vswitch_servers::read(&client, current_state).await?,
            other => return Err(ProviderError::UnknownResource(other.to_string())),
        };
        if state.is_null() {
            tracing::warn!(resource_type, "Resource no longer exists");
        }
        Ok(state)
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        let timeouts = &self.timeouts;
        let state = match resource_type {
            firewall::TYPE_NAME => firewall::update(&client, timeouts, planned_state).await?,
            os_rescue::TYPE_NAME => os_rescue::update(&client, planned_state).await?,
            vswitch::TYPE_NAME => {
                vswitch::update(&client, timeouts, prior_state, planned_state).await?
            },
            vswitch_servers::TYPE_NAME => {
                vswitch_servers::update(&client, timeouts, prior_state, planned_state).await?
            },
            other => return Err(ProviderError::UnknownResource(other.to_string())),
        };
        tracing::info!(resource_type, id = ?state.get("id"), "Updated resource");
        Ok(state)
    }

    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let client = self.client().await?;
        let timeouts = &self.timeouts;
        let id = current_state.get("id").cloned();
        match resource_type {
            firewall::TYPE_NAME => firewall::delete(&client, timeouts, current_state).await?,
            os_rescue::TYPE_NAME => os_rescue::delete(current_state).await?,
            vswitch::TYPE_NAME => vswitch::delete(&client, current_state).await?,
            vswitch_servers::TYPE_NAME => {
                vswitch_servers::delete(&client, timeouts, current_state).await?
            },
            other => return Err(ProviderError::UnknownResource(other.to_string())),
        }
        tracing::info!(resource_type, ?id, "Deleted resource");
        Ok(())
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let client = self.client().await?;
        match resource_type {
            firewall::TYPE_NAME => firewall::import(&client, id).await,
            vswitch::TYPE_NAME => vswitch::import(&client, id).await,
            os_rescue::TYPE_NAME | vswitch_servers::TYPE_NAME => Err(ProviderError::Sdk(format!(
                "Import not supported for resource type: {}",
                resource_type
            ))),
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = Self::data_source_schema(data_source_type)?;
        let mut diagnostics = validate(&schema, &config);
        diagnostics.extend(data_sources::validate_ids(&config));
        Ok(diagnostics)
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        match data_source_type {
            data_sources::server::TYPE_NAME => data_sources::server::read(&client, config).await,
            data_sources::vswitch::TYPE_NAME => data_sources::vswitch::read(&client, config).await,
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_lists_every_type() {
        let provider = HetznerRobotProvider::new();
        let metadata = provider.metadata();
        assert_eq!(
            metadata.resources,
            vec![
                "hetznerrobot_firewall",
                "hetznerrobot_os_rescue",
                "hetznerrobot_vswitch",
                "hetznerrobot_vswitch_servers",
            ]
        );
        assert_eq!(
            metadata.data_sources,
            vec!["hetznerrobot_server", "hetznerrobot_vswitch"]
        );
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let provider = HetznerRobotProvider::new();
        let err = provider
            .read(vswitch::TYPE_NAME, json!({"id": "1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_types() {
        let provider = HetznerRobotProvider::new();
        let err = provider
            .validate_resource_config("hetznerrobot_failover", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider
            .validate_data_source_config("hetznerrobot_rdns", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_configure_and_stop() {
        let provider = HetznerRobotProvider::new();
        let diagnostics = provider
            .configure(json!({"username": "robot", "password": "secret", "url": "http://127.0.0.1:1/"}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(
            provider.client().await.unwrap().config().base_url,
            "http://127.0.0.1:1"
        );

        provider.stop().await.unwrap();
        assert!(provider.client().await.is_err());
    }

    #[tokio::test]
    async fn test_validate_resource_config_adds_custom_checks() {
        let provider = HetznerRobotProvider::new();
        let diagnostics = provider
            .validate_resource_config(
                firewall::TYPE_NAME,
                json!({
                    "server_id": "7",
                    "active": true,
                    "whitelist_hos": false,
                    "rule": [{"action": "reject"}]
                }),
            )
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("rule.0.action"));
    }

    #[tokio::test]
    async fn test_plan_ignores_server_order() {
        let provider = HetznerRobotProvider::new();
        let prior = json!({
            "id": "12",
            "name": "lan",
            "vlan": 4000,
            "servers": [1, 2],
            "incidents": []
        });
        let plan = provider
            .plan(
                vswitch::TYPE_NAME,
                Some(prior),
                json!({"name": "lan", "servers": [2, 1, 2]}),
                Value::Null,
            )
            .await
            .unwrap();
        assert!(!plan.has_changes());
    }

    #[tokio::test]
    async fn test_import_unsupported() {
        let provider = HetznerRobotProvider::new();
        provider
            .configure(json!({"username": "robot", "password": "secret"}))
            .await
            .unwrap();
        let err = provider
            .import_resource(os_rescue::TYPE_NAME, "321")
            .await
            .unwrap_err();
        assert!(err.message().contains("Import not supported"));
    }
}
