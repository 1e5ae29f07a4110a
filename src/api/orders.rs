//! Orders API (read-only)

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, Address, ListFilter, Metadata};
use super::customers::Customer;
use super::products::Product;
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const ORDERS_PATH: &str = "/v1/orders/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Refunded,
    PartiallyRefunded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingReason {
    Purchase,
    SubscriptionCreate,
    SubscriptionCycle,
    SubscriptionUpdate,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductBillingType {
    OneTime,
    Recurring,
}

impl fmt::Display for ProductBillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProductBillingType::OneTime => "one_time",
            ProductBillingType::Recurring => "recurring",
        })
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderItem {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub tax_amount: i64,
    #[serde(default)]
    pub proration: bool,
    #[serde(default)]
    pub product_price_id: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Order {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    #[serde(default)]
    pub paid: bool,
    /// Amounts in cents
    #[serde(default)]
    pub subtotal_amount: i64,
    #[serde(default)]
    pub discount_amount: i64,
    #[serde(default)]
    pub net_amount: i64,
    #[serde(default)]
    pub tax_amount: i64,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default)]
    pub refunded_amount: i64,
    #[serde(default)]
    pub refunded_tax_amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub billing_reason: Option<BillingReason>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub discount_id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub checkout_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderListQuery {
    filter: ListFilter,
    product_ids: Vec<String>,
    product_billing_type: Option<ProductBillingType>,
    discount_ids: Vec<String>,
    customer_ids: Vec<String>,
    external_customer_ids: Vec<String>,
    checkout_ids: Vec<String>,
}

impl OrderListQuery {
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

    pub fn product_billing_type(mut self, billing_type: ProductBillingType) -> Self {
        self.product_billing_type = Some(billing_type);
        self
    }

    pub fn discount_id(mut self, id: impl Into<String>) -> Self {
        self.discount_ids.push(id.into());
        self
    }

    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_ids.push(id.into());
        self
    }

    pub fn external_customer_id(mut self, id: impl Into<String>) -> Self {
        self.external_customer_ids.push(id.into());
        self
    }

    pub fn checkout_id(mut self, id: impl Into<String>) -> Self {
        self.checkout_ids.push(id.into());
        self
    }

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }
}

impl ListQuery for OrderListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params
            .push_all("product_id", &self.product_ids)
            .push_opt("product_billing_type", self.product_billing_type)
            .push_all("discount_id", &self.discount_ids)
            .push_all("customer_id", &self.customer_ids)
            .push_all("external_customer_id", &self.external_customer_ids)
            .push_all("checkout_id", &self.checkout_ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct OrdersApi {
    context: Arc<PolarContext>,
}

impl OrdersApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn list(
        &self,
        query: &OrderListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Order>> {
        self.context.list(ORDERS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &OrderListQuery,
    ) -> impl Stream<Item = PolarResult<Order>> + Send + 'static {
        self.context.list_all(self.api_name(), ORDERS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Order> {
        self.context
            .client
            .get(&resource_path(ORDERS_PATH, id)?, &[])
            .await
    }
}

impl PolarApi for OrdersApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "orders"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserialize() {
        let json = r#"{
            "id": "ord_1",
            "created_at": "2024-01-01T00:00:00Z",
            "status": "partially_refunded",
            "paid": true,
            "subtotal_amount": 2000,
            "discount_amount": 0,
            "net_amount": 2000,
            "tax_amount": 400,
            "total_amount": 2400,
            "refunded_amount": 1000,
            "currency": "eur",
            "billing_reason": "subscription_cycle",
            "customer_id": "cus_1",
            "subscription_id": "sub_1",
            "items": [{"id": "item_1", "label": "Pro (monthly)", "amount": 2000, "tax_amount": 400, "proration": false}]
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyRefunded);
        assert_eq!(order.billing_reason, Some(BillingReason::SubscriptionCycle));
        assert_eq!(order.items[0].amount, 2000);
        assert_eq!(order.total_amount, 2400);
    }

    #[test]
    fn test_list_query_billing_type() {
        let pairs = OrderListQuery::new()
            .product_billing_type(ProductBillingType::OneTime)
            .customer_id("cus_1")
            .to_query()
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("product_billing_type".to_string(), "one_time".to_string()),
                ("customer_id".to_string(), "cus_1".to_string()),
            ]
        );
    }
}
