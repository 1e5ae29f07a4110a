//! Products API

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::benefits::Benefit;
use super::common::{resource_path, ListFilter, Metadata};
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const PRODUCTS_PATH: &str = "/v1/products/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceAmountType {
    Fixed,
    Custom,
    Free,
    MeteredUnit,
    #[serde(other)]
    Unknown,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductPrice {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub amount_type: PriceAmountType,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub product_id: String,
    /// `one_time` or `recurring`
    #[serde(default, rename = "type")]
    pub price_type: Option<String>,
    #[serde(default)]
    pub recurring_interval: Option<RecurringInterval>,
    #[serde(default)]
    pub price_currency: Option<String>,
    /// Fixed amount in cents
    #[serde(default)]
    pub price_amount: Option<i64>,
    #[serde(default)]
    pub minimum_amount: Option<i64>,
    #[serde(default)]
    pub maximum_amount: Option<i64>,
    #[serde(default)]
    pub preset_amount: Option<i64>,
    /// Decimal string, cents per unit
    #[serde(default)]
    pub unit_amount: Option<String>,
    #[serde(default)]
    pub cap_amount: Option<i64>,
    #[serde(default)]
    pub meter_id: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Product {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recurring_interval: Option<RecurringInterval>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub prices: Vec<ProductPrice>,
    #[serde(default)]
    pub benefits: Vec<Benefit>,
}

/// A new price, tagged by its `amount_type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "amount_type", rename_all = "snake_case")]
pub enum ProductPriceCreate {
    Fixed {
        price_amount: i64,
        price_currency: String,
    },
    Custom {
        price_currency: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum_amount: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum_amount: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        preset_amount: Option<i64>,
    },
    Free,
    MeteredUnit {
        meter_id: String,
        unit_amount: String,
        price_currency: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cap_amount: Option<i64>,
    },
}

impl ProductPriceCreate {
    /// Fixed USD price in cents.
    pub fn fixed_usd(cents: i64) -> Self {
        ProductPriceCreate::Fixed {
            price_amount: cents,
            price_currency: "usd".to_string(),
        }
    }
}

/// In an update, existing prices are kept by ID and omitted ones are archived.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProductPriceUpdate {
    Existing { id: String },
    New(ProductPriceCreate),
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `None` for a one-time product
    pub recurring_interval: Option<RecurringInterval>,
    pub prices: Vec<ProductPriceCreate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl ProductCreate {
    pub fn one_time(name: impl Into<String>, price: ProductPriceCreate) -> Self {
        Self {
            name: name.into(),
            description: None,
            recurring_interval: None,
            prices: vec![price],
            organization_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn recurring(
        name: impl Into<String>,
        interval: RecurringInterval,
        price: ProductPriceCreate,
    ) -> Self {
        Self {
            recurring_interval: Some(interval),
            ..Self::one_time(name, price)
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
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

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<ProductPriceUpdate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl ProductUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.is_archived = Some(archived);
        self
    }

    pub fn prices(mut self, prices: Vec<ProductPriceUpdate>) -> Self {
        self.prices = Some(prices);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct ProductBenefitsUpdate<'a> {
    benefits: &'a [String],
}

#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    filter: ListFilter,
    ids: Vec<String>,
    is_archived: Option<bool>,
    is_recurring: Option<bool>,
    benefit_ids: Vec<String>,
}

impl ProductListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.ids.push(id.into());
        self
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.filter.query = Some(query.into());
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.is_archived = Some(archived);
        self
    }

    pub fn recurring(mut self, recurring: bool) -> Self {
        self.is_recurring = Some(recurring);
        self
    }

    pub fn benefit_id(mut self, id: impl Into<String>) -> Self {
        self.benefit_ids.push(id.into());
        self
    }

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }
}

impl ListQuery for ProductListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params
            .push_all("id", &self.ids)
            .push_opt("is_archived", self.is_archived)
            .push_opt("is_recurring", self.is_recurring)
            .push_all("benefit_id", &self.benefit_ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct ProductsApi {
    context: Arc<PolarContext>,
}

impl ProductsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: &ProductCreate) -> PolarResult<Product> {
        self.context.client.post(PRODUCTS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &ProductListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Product>> {
        self.context.list(PRODUCTS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &ProductListQuery,
    ) -> impl Stream<Item = PolarResult<Product>> + Send + 'static {
        self.context.list_all(self.api_name(), PRODUCTS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Product> {
        self.context
            .client
            .get(&resource_path(PRODUCTS_PATH, id)?, &[])
            .await
    }

    pub async fn update(&self, id: &str, request: &ProductUpdate) -> PolarResult<Product> {
        self.context
            .client
            .patch(&resource_path(PRODUCTS_PATH, id)?, request)
            .await
    }

    /// Replace the benefits attached to a product.
    pub async fn update_benefits(&self, id: &str, benefit_ids: &[String]) -> PolarResult<Product> {
        let path = format!("{}/benefits", resource_path(PRODUCTS_PATH, id)?);
        let body = ProductBenefitsUpdate {
            benefits: benefit_ids,
        };
        self.context.client.post(&path, &body).await
    }
}

impl PolarApi for ProductsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "products"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserialize() {
        let json = r#"{
            "id": "prod_1",
            "created_at": "2024-01-01T00:00:00Z",
            "name": "Pro",
            "description": null,
            "recurring_interval": "month",
            "is_recurring": true,
            "is_archived": false,
            "organization_id": "org_1",
            "prices": [
                {"id": "price_1", "amount_type": "fixed", "type": "recurring", "price_amount": 1500, "price_currency": "usd", "product_id": "prod_1"},
                {"id": "price_2", "amount_type": "metered_unit", "unit_amount": "0.5", "meter_id": "m_1"},
                {"id": "price_3", "amount_type": "seat_based"}
            ],
            "benefits": [],
            "medias": []
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.recurring_interval, Some(RecurringInterval::Month));
        assert_eq!(product.prices[0].price_amount, Some(1500));
        assert_eq!(product.prices[0].price_type.as_deref(), Some("recurring"));
        assert_eq!(product.prices[1].amount_type, PriceAmountType::MeteredUnit);
        assert_eq!(product.prices[2].amount_type, PriceAmountType::Unknown);
    }

    #[test]
    fn test_create_one_time() {
        let request = ProductCreate::one_time("E-book", ProductPriceCreate::fixed_usd(900));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "E-book",
                "recurring_interval": null,
                "prices": [{"amount_type": "fixed", "price_amount": 900, "price_currency": "usd"}]
            })
        );
    }

    #[test]
    fn test_update_prices_mix_existing_and_new() {
        let request = ProductUpdate::new().prices(vec![
            ProductPriceUpdate::Existing {
                id: "price_1".into(),
            },
            ProductPriceUpdate::New(ProductPriceCreate::Free),
        ]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"prices": [{"id": "price_1"}, {"amount_type": "free"}]})
        );
    }

    #[test]
    fn test_list_query() {
        let pairs = ProductListQuery::new()
            .archived(false)
            .recurring(true)
            .benefit_id("ben_1")
            .to_query()
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("is_archived".to_string(), "false".to_string()),
                ("is_recurring".to_string(), "true".to_string()),
                ("benefit_id".to_string(), "ben_1".to_string()),
            ]
        );
    }
}
