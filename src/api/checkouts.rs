//! Checkout sessions API

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, Address, ListFilter, Metadata};
use super::products::Product;
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const CHECKOUTS_PATH: &str = "/v1/checkouts/";
const CLIENT_PATH: &str = "/v1/checkouts/client/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    Open,
    Expired,
    Confirmed,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl CheckoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Open => "open",
            CheckoutStatus::Expired => "expired",
            CheckoutStatus::Confirmed => "confirmed",
            CheckoutStatus::Succeeded => "succeeded",
            CheckoutStatus::Failed => "failed",
            CheckoutStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Checkout {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    pub status: CheckoutStatus,
    /// Secret used by the embedded checkout; safe to hand to the browser.
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub success_url: String,
    #[serde(default)]
    pub embed_origin: Option<String>,
    /// Amounts in cents
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub discount_amount: i64,
    #[serde(default)]
    pub net_amount: i64,
    #[serde(default)]
    pub tax_amount: Option<i64>,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub product_price_id: String,
    #[serde(default)]
    pub discount_id: Option<String>,
    #[serde(default)]
    pub allow_discount_codes: bool,
    #[serde(default)]
    pub is_payment_required: bool,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_external_id: Option<String>,
    #[serde(default)]
    pub customer_billing_address: Option<Address>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutCreate {
    /// Product IDs offered in the checkout; the first one is selected.
    pub products: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_discount_codes: Option<bool>,
    /// Custom amount in cents, for pay-what-you-want prices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub customer_metadata: Metadata,
}

impl CheckoutCreate {
    pub fn new<I, S>(products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            products: products.into_iter().map(Into::into).collect(),
            success_url: None,
            embed_origin: None,
            customer_id: None,
            external_customer_id: None,
            customer_email: None,
            customer_name: None,
            customer_billing_address: None,
            discount_id: None,
            allow_discount_codes: None,
            amount: None,
            metadata: Metadata::new(),
            customer_metadata: Metadata::new(),
        }
    }

    /// May contain `{CHECKOUT_ID}`, replaced by the checkout ID on redirect.
    pub fn success_url(mut self, url: impl Into<String>) -> Self {
        self.success_url = Some(url.into());
        self
    }

    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    pub fn external_customer_id(mut self, id: impl Into<String>) -> Self {
        self.external_customer_id = Some(id.into());
        self
    }

    pub fn customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn discount_id(mut self, id: impl Into<String>) -> Self {
        self.discount_id = Some(id.into());
        self
    }

    pub fn amount(mut self, cents: i64) -> Self {
        self.amount = Some(cents);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_discount_codes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CheckoutUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product_id(mut self, id: impl Into<String>) -> Self {
        self.product_id = Some(id.into());
        self
    }

    pub fn customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn discount_id(mut self, id: impl Into<String>) -> Self {
        self.discount_id = Some(id.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutListQuery {
    filter: ListFilter,
    product_ids: Vec<String>,
    customer_ids: Vec<String>,
    statuses: Vec<CheckoutStatus>,
}

impl CheckoutListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }

    pub fn product_id(mut self, id: impl Into<String>) -> Self {
        self.product_ids.push(id.into());
        self
    }

    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_ids.push(id.into());
        self
    }

    pub fn status(mut self, status: CheckoutStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.filter.query = Some(query.into());
        self
    }

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }
}

impl ListQuery for CheckoutListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params
            .push_all("product_id", &self.product_ids)
            .push_all("customer_id", &self.customer_ids)
            .push_all("status", &self.statuses);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutsApi {
    context: Arc<PolarContext>,
}

impl CheckoutsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: &CheckoutCreate) -> PolarResult<Checkout> {
        self.context.client.post(CHECKOUTS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &CheckoutListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Checkout>> {
        self.context.list(CHECKOUTS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &CheckoutListQuery,
    ) -> impl Stream<Item = PolarResult<Checkout>> + Send + 'static {
        self.context.list_all(self.api_name(), CHECKOUTS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Checkout> {
        self.context
            .client
            .get(&resource_path(CHECKOUTS_PATH, id)?, &[])
            .await
    }

    pub async fn update(&self, id: &str, request: &CheckoutUpdate) -> PolarResult<Checkout> {
        self.context
            .client
            .patch(&resource_path(CHECKOUTS_PATH, id)?, request)
            .await
    }

    /// Fetch a checkout by its client secret, as the embedded checkout does.
    pub async fn client_get(&self, client_secret: &str) -> PolarResult<Checkout> {
        self.context
            .client
            .get(&resource_path(CLIENT_PATH, client_secret)?, &[])
            .await
    }
}

impl PolarApi for CheckoutsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "checkouts"
    }
}
