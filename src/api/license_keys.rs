//! License keys API
//!
//! Management endpoints use the organization access token. Validation,
//! activation and deactivation live under the customer portal and are meant
//! to be called from the licensed software itself.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{path_segment, resource_path, ListFilter, Metadata};
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const LICENSE_KEYS_PATH: &str = "/v1/license-keys/";
const VALIDATE_PATH: &str = "/v1/customer-portal/license-keys/validate";
const ACTIVATE_PATH: &str = "/v1/customer-portal/license-keys/activate";
const DEACTIVATE_PATH: &str = "/v1/customer-portal/license-keys/deactivate";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseKeyStatus {
    Granted,
    Revoked,
    Disabled,
    #[serde(other)]
    Unknown,
}

impl LicenseKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseKeyStatus::Granted => "granted",
            LicenseKeyStatus::Revoked => "revoked",
            LicenseKeyStatus::Disabled => "disabled",
            LicenseKeyStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LicenseKeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[non_exhaustive]
#[derive(Clone, Deserialize, Serialize)]
pub struct LicenseKey {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub benefit_id: String,
    pub key: String,
    #[serde(default)]
    pub display_key: String,
    pub status: LicenseKeyStatus,
    #[serde(default)]
    pub limit_activations: Option<u32>,
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub limit_usage: Option<u64>,
    #[serde(default)]
    pub validations: u64,
    #[serde(default)]
    pub last_validated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseKey")
            .field("id", &self.id)
            .field("display_key", &self.display_key)
            .field("status", &self.status)
            .field("customer_id", &self.customer_id)
            .field("usage", &self.usage)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// A key together with its activations, as returned by `get`.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LicenseKeyWithActivations {
    #[serde(flatten)]
    pub license_key: LicenseKey,
    #[serde(default)]
    pub activations: Vec<LicenseKeyActivation>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LicenseKeyActivation {
    pub id: String,
    pub license_key_id: String,
    pub label: String,
    #[serde(default)]
    pub meta: Metadata,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Activation as embedded in a validation result, with its parent key.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LicenseKeyActivationWithKey {
    #[serde(flatten)]
    pub activation: LicenseKeyActivation,
    pub license_key: LicenseKey,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidatedLicenseKey {
    #[serde(flatten)]
    pub license_key: LicenseKey,
    #[serde(default)]
    pub activation: Option<LicenseKeyActivation>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct LicenseKeyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LicenseKeyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_activations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_usage: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LicenseKeyUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: LicenseKeyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn usage(mut self, usage: u64) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn limit_activations(mut self, limit: u32) -> Self {
        self.limit_activations = Some(limit);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Body of a customer-portal validation.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct LicenseKeyValidate {
    pub key: String,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Usage to add to the key when validation succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment_usage: Option<u64>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub conditions: Metadata,
}

impl LicenseKeyValidate {
    pub fn new(key: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            organization_id: organization_id.into(),
            activation_id: None,
            benefit_id: None,
            customer_id: None,
            increment_usage: None,
            conditions: Metadata::new(),
        }
    }

    pub fn activation_id(mut self, id: impl Into<String>) -> Self {
        self.activation_id = Some(id.into());
        self
    }

    pub fn increment_usage(mut self, amount: u64) -> Self {
        self.increment_usage = Some(amount);
        self
    }

    pub fn conditions(mut self, conditions: Metadata) -> Self {
        self.conditions = conditions;
        self
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct LicenseKeyActivate {
    pub key: String,
    pub organization_id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub conditions: Metadata,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub meta: Metadata,
}

impl LicenseKeyActivate {
    pub fn new(
        key: impl Into<String>,
        organization_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            organization_id: organization_id.into(),
            label: label.into(),
            conditions: Metadata::new(),
            meta: Metadata::new(),
        }
    }

    pub fn conditions(mut self, conditions: Metadata) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct LicenseKeyDeactivate {
    pub key: String,
    pub organization_id: String,
    pub activation_id: String,
}

impl LicenseKeyDeactivate {
    pub fn new(
        key: impl Into<String>,
        organization_id: impl Into<String>,
        activation_id: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            organization_id: organization_id.into(),
            activation_id: activation_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LicenseKeyListQuery {
    filter: ListFilter,
    benefit_ids: Vec<String>,
}

impl LicenseKeyListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }

    pub fn benefit_id(mut self, id: impl Into<String>) -> Self {
        self.benefit_ids.push(id.into());
        self
    }
}

impl ListQuery for LicenseKeyListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params.push_all("benefit_id", &self.benefit_ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct LicenseKeysApi {
    context: Arc<PolarContext>,
}

impl LicenseKeysApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn list(
        &self,
        query: &LicenseKeyListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<LicenseKey>> {
        self.context.list(LICENSE_KEYS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &LicenseKeyListQuery,
    ) -> impl Stream<Item = PolarResult<LicenseKey>> + Send + 'static {
        self.context
            .list_all(self.api_name(), LICENSE_KEYS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<LicenseKeyWithActivations> {
        self.context
            .client
            .get(&resource_path(LICENSE_KEYS_PATH, id)?, &[])
            .await
    }

    pub async fn update(&self, id: &str, request: &LicenseKeyUpdate) -> PolarResult<LicenseKey> {
        self.context
            .client
            .patch(&resource_path(LICENSE_KEYS_PATH, id)?, request)
            .await
    }

    pub async fn get_activation(
        &self,
        id: &str,
        activation_id: &str,
    ) -> PolarResult<LicenseKeyActivationWithKey> {
        let path = format!(
            "{}/activations/{}",
            resource_path(LICENSE_KEYS_PATH, id)?,
            path_segment("activation_id", activation_id)?
        );
        self.context.client.get(&path, &[]).await
    }

    /// Validate a key, optionally bound to an activation.
    ///
    /// An unknown or revoked key surfaces as `PolarError::NotFound`.
    pub async fn validate(&self, request: &LicenseKeyValidate) -> PolarResult<ValidatedLicenseKey> {
        self.context.client.post(VALIDATE_PATH, request).await
    }

    pub async fn activate(
        &self,
        request: &LicenseKeyActivate,
    ) -> PolarResult<LicenseKeyActivationWithKey> {
        self.context.client.post(ACTIVATE_PATH, request).await
    }

    pub async fn deactivate(&self, request: &LicenseKeyDeactivate) -> PolarResult<()> {
        self.context
            .client
            .post_no_content(DEACTIVATE_PATH, request)
            .await
    }
}

impl PolarApi for LicenseKeysApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "license_keys"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_JSON: &str = r#"{
        "id": "lk_1",
        "created_at": "2024-02-01T00:00:00Z",
        "organization_id": "org_1",
        "customer_id": "cus_1",
        "benefit_id": "ben_1",
        "key": "POLAR-ABCD-EFGH-1234",
        "display_key": "****-1234",
        "status": "granted",
        "limit_activations": 3,
        "usage": 4,
        "limit_usage": null,
        "validations": 10,
        "expires_at": null
    }"#;

    #[test]
    fn test_license_key_debug_hides_key() {
        let key: LicenseKey = serde_json::from_str(KEY_JSON).unwrap();
        assert_eq!(key.status, LicenseKeyStatus::Granted);
        assert_eq!(key.limit_activations, Some(3));
        let debug = format!("{key:?}");
        assert!(debug.contains("****-1234"));
        assert!(!debug.contains("ABCD"));
    }

    #[test]
    fn test_validated_key_with_activation() {
        let mut value: serde_json::Value = serde_json::from_str(KEY_JSON).unwrap();
        value["activation"] = serde_json::json!({
            "id": "act_1",
            "license_key_id": "lk_1",
            "label": "laptop",
            "meta": {"os": "linux"},
            "created_at": "2024-02-02T00:00:00Z"
        });
        let validated: ValidatedLicenseKey = serde_json::from_value(value).unwrap();
        assert_eq!(validated.license_key.id, "lk_1");
        assert_eq!(validated.activation.unwrap().label, "laptop");
    }

    #[test]
    fn test_validate_body() {
        let request = LicenseKeyValidate::new("POLAR-KEY", "org_1").increment_usage(1);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "key": "POLAR-KEY",
                "organization_id": "org_1",
                "increment_usage": 1
            })
        );
    }

    #[test]
    fn test_unknown_status() {
        let status: LicenseKeyStatus = serde_json::from_str(r#""suspended""#).unwrap();
        assert_eq!(status, LicenseKeyStatus::Unknown);
    }
}
