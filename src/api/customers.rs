//! Customers API
//!
//! Customers can be addressed either by their Polar ID or by the
//! `external_id` your own system assigned them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, Address, ListFilter, Metadata};
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const CUSTOMERS_PATH: &str = "/v1/customers/";
const EXTERNAL_PATH: &str = "/v1/customers/external/";

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Customer {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub external_id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub tax_id: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct CustomerCreate {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl CustomerCreate {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            external_id: None,
            billing_address: None,
            tax_id: None,
            organization_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn billing_address(mut self, address: Address) -> Self {
        self.billing_address = Some(address);
        self
    }

    pub fn organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Partial update; only the fields that are set are sent.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CustomerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn billing_address(mut self, address: Address) -> Self {
        self.billing_address = Some(address);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Customer with their active subscriptions, granted benefits and meter balances.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerState {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(default)]
    pub active_subscriptions: Vec<CustomerStateSubscription>,
    #[serde(default)]
    pub granted_benefits: Vec<CustomerStateBenefitGrant>,
    #[serde(default)]
    pub active_meters: Vec<CustomerStateMeter>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerStateSubscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub recurring_interval: Option<String>,
    #[serde(default)]
    pub current_period_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub discount_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerStateBenefitGrant {
    pub id: String,
    #[serde(default)]
    pub granted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub benefit_id: String,
    #[serde(default)]
    pub benefit_type: String,
    #[serde(default)]
    pub properties: serde_json::Value,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerStateMeter {
    pub id: String,
    #[serde(default)]
    pub meter_id: String,
    #[serde(default)]
    pub consumed_units: f64,
    #[serde(default)]
    pub credited_units: i64,
    #[serde(default)]
    pub balance: f64,
}

/// Filters for [`CustomersApi::list`].
#[derive(Debug, Clone, Default)]
pub struct CustomerListQuery {
    filter: ListFilter,
    email: Option<String>,
}

impl CustomerListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Free-text search on name, email and external ID.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.filter.query = Some(query.into());
        self
    }

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.metadata.insert(key.into(), value.into());
        self
    }
}

impl ListQuery for CustomerListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params.push_opt("email", self.email.as_deref());
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct CustomersApi {
    context: Arc<PolarContext>,
}

impl CustomersApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: &CustomerCreate) -> PolarResult<Customer> {
        self.context.client.post(CUSTOMERS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &CustomerListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Customer>> {
        self.context.list(CUSTOMERS_PATH, query, page).await
    }

    /// Stream every customer matching `query`, fetching pages as needed.
    pub fn list_all(
        &self,
        query: &CustomerListQuery,
    ) -> impl Stream<Item = PolarResult<Customer>> + Send + 'static {
        self.context.list_all(self.api_name(), CUSTOMERS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Customer> {
        self.context
            .client
            .get(&resource_path(CUSTOMERS_PATH, id)?, &[])
            .await
    }

    pub async fn update(&self, id: &str, request: &CustomerUpdate) -> PolarResult<Customer> {
        self.context
            .client
            .patch(&resource_path(CUSTOMERS_PATH, id)?, request)
            .await
    }

    /// Delete a customer. Their subscriptions are revoked immediately.
    pub async fn delete(&self, id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(CUSTOMERS_PATH, id)?)
            .await
    }

    pub async fn get_external(&self, external_id: &str) -> PolarResult<Customer> {
        self.context
            .client
            .get(&resource_path(EXTERNAL_PATH, external_id)?, &[])
            .await
    }

    pub async fn update_external(
        &self,
        external_id: &str,
        request: &CustomerUpdate,
    ) -> PolarResult<Customer> {
        self.context
            .client
            .patch(&resource_path(EXTERNAL_PATH, external_id)?, request)
            .await
    }

    pub async fn delete_external(&self, external_id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(EXTERNAL_PATH, external_id)?)
            .await
    }

    pub async fn get_state(&self, id: &str) -> PolarResult<CustomerState> {
        let path = format!("{}/state", resource_path(CUSTOMERS_PATH, id)?);
        self.context.client.get(&path, &[]).await
    }
}

impl PolarApi for CustomersApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "customers"
    }
}
