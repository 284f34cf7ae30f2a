//! Drive a [`ProviderService`] in tests without a gRPC server.
//!
//! ```ignore
//! use hemmer_provider_hetznerrobot::testing::{assert_plan_creates, ProviderTester};
//! use hemmer_provider_hetznerrobot::HetznerRobotProvider;
//! use serde_json::json;
//!
//! let tester = ProviderTester::new(HetznerRobotProvider::new());
//! tester
//!     .configure(json!({"username": "robot", "password": "secret", "url": mock.uri()}))
//!     .await?;
//! let plan = tester.plan_create("hetznerrobot_vswitch", json!({"name": "lan"})).await?;
//! assert_plan_creates(&plan);
//! ```

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Calls provider operations the way the host would.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Validate the provider block; error diagnostics become `Err`.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        errors_only(self.provider.validate_provider_config(config).await?)
    }

    /// Configure the provider; error diagnostics become `Err`.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        errors_only(self.provider.configure(config).await?)
    }

    /// Validate a resource configuration; error diagnostics become `Err`.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        errors_only(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    /// Validate a data source configuration; error diagnostics become `Err`.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        errors_only(
            self.provider
                .validate_data_source_config(data_source_type, config)
                .await?,
        )
    }

    /// Plan without prior state.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan from `prior` towards `config`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior), config.clone(), config)
            .await
    }

    /// Plan the removal of `prior`.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior), Value::Null, Value::Null)
            .await
    }

    /// Create from a planned state.
    pub async fn create(&self, resource_type: &str, planned: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned).await
    }

    /// Refresh a state.
    pub async fn read(&self, resource_type: &str, current: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current).await
    }

    /// Update from `prior` to `planned`.
    pub async fn update(
        &self,
        resource_type: &str,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.update(resource_type, prior, planned).await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current).await
    }

    /// Import by id.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read_data_source(data_source_type, config).await
    }

    /// Plan, create, then read back.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan, update, then read back.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior.clone(), config)
            .await?;
        let updated = self
            .update(resource_type, prior, plan.planned_state)
            .await?;
        self.read(resource_type, updated).await
    }
}

/// A tester call failed.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// The provider returned error diagnostics.
    #[error("{}", describe(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn describe(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("{} error diagnostic(s):", diagnostics.len());
    for d in diagnostics {
        out.push_str("\n  ");
        out.push_str(&d.summary);
        if let Some(detail) = &d.detail {
            out.push_str(": ");
            out.push_str(detail);
        }
        if let Some(attribute) = &d.attribute {
            out.push_str(&format!(" (at {})", attribute));
        }
    }
    out
}

fn errors_only(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<Diagnostic> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// The plan creates from nothing.
///
/// # Panics
///
/// Panics if the plan has no changes or replaces.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(plan.has_changes(), "expected a create plan, got no changes");
    assert!(
        plan.changes.iter().all(|c| c.before.is_none()),
        "expected only added attributes, got {:?}",
        plan.changes
    );
    assert!(!plan.requires_replace, "a create plan must not replace");
}

/// The plan changes nothing.
///
/// # Panics
///
/// Panics if the plan has changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        !plan.has_changes(),
        "expected no changes, got {:?}",
        plan.changes
    );
}

/// The plan replaces the resource.
///
/// # Panics
///
/// Panics unless `requires_replace` is set.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "expected a replacement, changes were {:?}",
        plan.changes
    );
}

/// The plan updates in place.
///
/// # Panics
///
/// Panics if the plan has no changes or replaces.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(plan.has_changes(), "expected an update, got no changes");
    assert!(!plan.requires_replace, "expected an in-place update");
}

/// The plan touches `path`.
///
/// # Panics
///
/// Panics if no change has that path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "expected a change to '{}', got {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Some error diagnostic mentions `needle` in its summary or detail.
///
/// # Panics
///
/// Panics otherwise.
pub fn assert_error_contains(diagnostics: &[Diagnostic], needle: &str) {
    let found = diagnostics.iter().filter(|d| d.is_error()).any(|d| {
        d.summary.contains(needle) || d.detail.as_deref().is_some_and(|x| x.contains(needle))
    });
    assert!(found, "no error mentions '{}': {:?}", needle, diagnostics);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HetznerRobotProvider;
    use serde_json::json;

    fn tester() -> ProviderTester<HetznerRobotProvider> {
        ProviderTester::new(HetznerRobotProvider::new())
    }

    #[tokio::test]
    async fn test_provider_config_rejects_unknown_arguments() {
        let err = tester()
            .validate_provider_config(json!({"token": "abc"}))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diagnostics) => {
                assert_error_contains(&diagnostics, "Unsupported argument 'token'")
            },
            other => panic!("unexpected error {}", other),
        }
    }

    #[tokio::test]
    async fn test_plan_create_fills_defaults() {
        let plan = tester()
            .plan_create(
                "hetznerrobot_os_rescue",
                json!({"server_number": "321", "server_name": "web-1"}),
            )
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["rescue_os"], "linux");
    }

    #[tokio::test]
    async fn test_plan_replaces_on_server_change() {
        let prior = json!({
            "id": "7",
            "server_id": "7",
            "active": true,
            "whitelist_hos": false,
            "rule": [{"action": "accept"}]
        });
        let plan = tester()
            .plan_update(
                "hetznerrobot_firewall",
                prior,
                json!({"server_id": "8", "active": true, "whitelist_hos": false, "rule": [{"action": "accept"}]}),
            )
            .await
            .unwrap();
        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, "server_id");
        assert!(plan.planned_state.get("id").is_none());
    }

    #[tokio::test]
    async fn test_plan_rule_nulls_are_not_changes() {
        let prior = json!({
            "id": "7",
            "server_id": "7",
            "active": true,
            "whitelist_hos": false,
            "rule": [{"dst_port": "22", "action": "accept"}]
        });
        let plan = tester()
            .plan_update(
                "hetznerrobot_firewall",
                prior,
                json!({
                    "server_id": "7",
                    "active": true,
                    "whitelist_hos": false,
                    "rule": [{"name": null, "dst_port": "22", "action": "accept"}]
                }),
            )
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_plan_rename_is_in_place() {
        let prior = json!({"id": "12", "name": "lan", "vlan": 4000, "servers": [], "incidents": []});
        let plan = tester()
            .plan_update("hetznerrobot_vswitch", prior, json!({"name": "wan", "vlan": 4000}))
            .await
            .unwrap();
        assert_plan_updates_in_place(&plan);
        assert_plan_changes_attribute(&plan, "name");
    }

    #[tokio::test]
    async fn test_validate_resource_config_errors() {
        let err = tester()
            .validate_resource_config("hetznerrobot_vswitch", json!({"vlan": 100}))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diagnostics) => {
                assert_error_contains(&diagnostics, "name");
                assert_error_contains(&diagnostics, "VLAN");
            },
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_error_display_lists_diagnostics() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Invalid VLAN").with_attribute("vlan"),
            Diagnostic::error("Missing credentials").with_detail("Both needed"),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 error diagnostic(s):"));
        assert!(text.contains("Invalid VLAN (at vlan)"));
        assert!(text.contains("Missing credentials: Both needed"));
    }

    #[test]
    #[should_panic(expected = "expected no changes")]
    fn test_assert_no_changes_panics() {
        let plan = PlanResult {
            planned_state: json!({}),
            changes: vec![crate::types::AttributeChange::added("name", json!("lan"))],
            requires_replace: false,
        };
        assert_plan_no_changes(&plan);
    }
}
