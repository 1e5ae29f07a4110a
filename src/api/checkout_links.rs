//! Checkout links API
//!
//! A checkout link is a reusable URL that opens a new checkout session for
//! its products every time it is visited.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, ListFilter, Metadata};
use super::products::Product;
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const CHECKOUT_LINKS_PATH: &str = "/v1/checkout-links/";
const DEFAULT_PAYMENT_PROCESSOR: &str = "stripe";

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutLink {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub payment_processor: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub allow_discount_codes: bool,
    #[serde(default)]
    pub discount_id: Option<String>,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub url: String,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutLinkCreate {
    pub payment_processor: String,
    pub products: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_discount_codes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl CheckoutLinkCreate {
    pub fn new<I, S>(products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payment_processor: DEFAULT_PAYMENT_PROCESSOR.to_string(),
            products: products.into_iter().map(Into::into).collect(),
            label: None,
            success_url: None,
            allow_discount_codes: None,
            discount_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn success_url(mut self, url: impl Into<String>) -> Self {
        self.success_url = Some(url.into());
        self
    }

    pub fn discount_id(mut self, id: impl Into<String>) -> Self {
        self.discount_id = Some(id.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutLinkUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_discount_codes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CheckoutLinkUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn products(mut self, products: Vec<String>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn allow_discount_codes(mut self, allow: bool) -> Self {
        self.allow_discount_codes = Some(allow);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutLinkListQuery {
    filter: ListFilter,
    product_ids: Vec<String>,
}

impl CheckoutLinkListQuery {
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

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }
}

impl ListQuery for CheckoutLinkListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params.push_all("product_id", &self.product_ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutLinksApi {
    context: Arc<PolarContext>,
}

impl CheckoutLinksApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: &CheckoutLinkCreate) -> PolarResult<CheckoutLink> {
        self.context.client.post(CHECKOUT_LINKS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &CheckoutLinkListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<CheckoutLink>> {
        self.context.list(CHECKOUT_LINKS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &CheckoutLinkListQuery,
    ) -> impl Stream<Item = PolarResult<CheckoutLink>> + Send + 'static {
        self.context
            .list_all(self.api_name(), CHECKOUT_LINKS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<CheckoutLink> {
        self.context
            .client
            .get(&resource_path(CHECKOUT_LINKS_PATH, id)?, &[])
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &CheckoutLinkUpdate,
    ) -> PolarResult<CheckoutLink> {
        self.context
            .client
            .patch(&resource_path(CHECKOUT_LINKS_PATH, id)?, request)
            .await
    }

    pub async fn delete(&self, id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(CHECKOUT_LINKS_PATH, id)?)
            .await
    }
}

impl PolarApi for CheckoutLinksApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "checkout_links"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults_to_stripe() {
        let request = CheckoutLinkCreate::new(["prod_1"]).label("Launch promo");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "payment_processor": "stripe",
                "products": ["prod_1"],
                "label": "Launch promo"
            })
        );
    }

    #[test]
    fn test_checkout_link_deserialize() {
        let json = r#"{
            "id": "cl_1",
            "created_at": "2024-03-01T00:00:00Z",
            "payment_processor": "stripe",
            "client_secret": "polar_cl_xyz",
            "label": null,
            "allow_discount_codes": true,
            "organization_id": "org_1",
            "products": [],
            "url": "https://buy.polar.sh/polar_cl_xyz"
        }"#;
        let link: CheckoutLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.url, "https://buy.polar.sh/polar_cl_xyz");
        assert!(link.label.is_none());
    }
}
