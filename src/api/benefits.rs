//! Benefits API
//!
//! A benefit is something granted to customers who buy a product: a
//! license key, file downloads, repository access, meter credits, ...
//! Type-specific settings live in `properties` and are passed through as JSON.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{self, Either};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{resource_path, ListFilter, Metadata};
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const BENEFITS_PATH: &str = "/v1/benefits/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitType {
    Custom,
    Discord,
    GithubRepository,
    Downloadables,
    LicenseKeys,
    MeterCredit,
    #[serde(other)]
    Unknown,
}

impl BenefitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BenefitType::Custom => "custom",
            BenefitType::Discord => "discord",
            BenefitType::GithubRepository => "github_repository",
            BenefitType::Downloadables => "downloadables",
            BenefitType::LicenseKeys => "license_keys",
            BenefitType::MeterCredit => "meter_credit",
            BenefitType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BenefitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Benefit {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub benefit_type: BenefitType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub selectable: bool,
    #[serde(default)]
    pub deletable: bool,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub properties: Value,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct BenefitCreate {
    #[serde(rename = "type")]
    pub benefit_type: BenefitType,
    pub description: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl BenefitCreate {
    pub fn new(
        benefit_type: BenefitType,
        description: impl Into<String>,
        properties: Value,
    ) -> Self {
        Self {
            benefit_type,
            description: description.into(),
            properties,
            organization_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Updates are discriminated by the benefit's type, which cannot change.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct BenefitUpdate {
    #[serde(rename = "type")]
    pub benefit_type: BenefitType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl BenefitUpdate {
    pub fn new(benefit_type: BenefitType) -> Self {
        Self {
            benefit_type,
            description: None,
            properties: None,
            metadata: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn properties(mut self, properties: Value) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A benefit granted (or revoked) for one customer.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BenefitGrant {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub granted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_granted: bool,
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_revoked: bool,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub benefit_id: String,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub properties: Value,
}

#[derive(Debug, Clone, Default)]
pub struct BenefitListQuery {
    filter: ListFilter,
    types: Vec<BenefitType>,
}

impl BenefitListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }

    pub fn benefit_type(mut self, benefit_type: BenefitType) -> Self {
        self.types.push(benefit_type);
        self
    }

    /// Search on description.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.filter.query = Some(query.into());
        self
    }

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }
}

impl ListQuery for BenefitListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params.push_all("type", &self.types);
        Ok(params.into_pairs())
    }
}

/// Filters for [`BenefitsApi::grants`].
#[derive(Debug, Clone, Default)]
pub struct BenefitGrantQuery {
    is_granted: Option<bool>,
    customer_ids: Vec<String>,
}

impl BenefitGrantQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn granted(mut self, granted: bool) -> Self {
        self.is_granted = Some(granted);
        self
    }

    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_ids.push(id.into());
        self
    }
}

impl ListQuery for BenefitGrantQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        params
            .push_opt("is_granted", self.is_granted)
            .push_all("customer_id", &self.customer_ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct BenefitsApi {
    context: Arc<PolarContext>,
}

impl BenefitsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: &BenefitCreate) -> PolarResult<Benefit> {
        self.context.client.post(BENEFITS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &BenefitListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Benefit>> {
        self.context.list(BENEFITS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &BenefitListQuery,
    ) -> impl Stream<Item = PolarResult<Benefit>> + Send + 'static {
        self.context.list_all(self.api_name(), BENEFITS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Benefit> {
        self.context
            .client
            .get(&resource_path(BENEFITS_PATH, id)?, &[])
            .await
    }

    pub async fn update(&self, id: &str, request: &BenefitUpdate) -> PolarResult<Benefit> {
        self.context
            .client
            .patch(&resource_path(BENEFITS_PATH, id)?, request)
            .await
    }

    /// Delete a benefit. Grants of it are revoked.
    pub async fn delete(&self, id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(BENEFITS_PATH, id)?)
            .await
    }

    /// One page of the grants of a benefit.
    pub async fn grants(
        &self,
        id: &str,
        query: &BenefitGrantQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<BenefitGrant>> {
        let path = format!("{}/grants", resource_path(BENEFITS_PATH, id)?);
        self.context.list(&path, query, page).await
    }

    /// Every grant of a benefit. An invalid `id` is the only item.
    pub fn list_all_grants(
        &self,
        id: &str,
        query: &BenefitGrantQuery,
    ) -> impl Stream<Item = PolarResult<BenefitGrant>> + Send + 'static {
        match resource_path(BENEFITS_PATH, id) {
            Ok(base) => Either::Left(self.context.list_all(
                self.api_name(),
                format!("{base}/grants"),
                query,
            )),
            Err(e) => Either::Right(stream::once(future::ready(Err(e)))),
        }
    }
}

impl PolarApi for BenefitsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "benefits"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benefit_deserialize() {
        let json = r#"{
            "id": "ben_1",
            "created_at": "2024-01-01T00:00:00Z",
            "type": "license_keys",
            "description": "License key",
            "selectable": true,
            "deletable": true,
            "organization_id": "org_1",
            "properties": {"prefix": "ACME", "limit_usage": 3}
        }"#;

        let benefit: Benefit = serde_json::from_str(json).unwrap();
        assert_eq!(benefit.benefit_type, BenefitType::LicenseKeys);
        assert_eq!(benefit.properties["prefix"], "ACME");
    }

    #[test]
    fn test_create_body() {
        let request = BenefitCreate::new(
            BenefitType::Custom,
            "Private Slack",
            serde_json::json!({"note": "Join at slack.example.com"}),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "custom");
        assert_eq!(json["description"], "Private Slack");
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_grant_query() {
        let pairs = BenefitGrantQuery::new()
            .granted(true)
            .customer_id("cus_1")
            .to_query()
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("is_granted".to_string(), "true".to_string()),
                ("customer_id".to_string(), "cus_1".to_string()),
            ]
        );
    }
}
