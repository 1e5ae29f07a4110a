//! Subscriptions API

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, ListFilter, Metadata};
use super::customers::Customer;
use super::products::{Product, RecurringInterval};
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const SUBSCRIPTIONS_PATH: &str = "/v1/subscriptions/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Incomplete,
    IncompleteExpired,
    Trialing,
    Active,
    PastDue,
    Canceled,
    Unpaid,
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// Whether the customer currently has access.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    CustomerService,
    LowQuality,
    MissingFeatures,
    SwitchedService,
    TooComplex,
    TooExpensive,
    Unused,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProrationBehavior {
    Invoice,
    Prorate,
}

impl fmt::Display for ProrationBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProrationBehavior::Invoice => "invoice",
            ProrationBehavior::Prorate => "prorate",
        })
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subscription {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    /// Amount per period in cents
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub recurring_interval: Option<RecurringInterval>,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_period_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub discount_id: Option<String>,
    #[serde(default)]
    pub checkout_id: Option<String>,
    #[serde(default)]
    pub customer_cancellation_reason: Option<CancellationReason>,
    #[serde(default)]
    pub customer_cancellation_comment: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub product: Option<Product>,
}

/// Change product, apply a discount, or schedule a cancellation.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proration_behavior: Option<ProrationBehavior>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_at_period_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_cancellation_reason: Option<CancellationReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_cancellation_comment: Option<String>,
}

impl SubscriptionUpdate {
    pub fn change_product(product_id: impl Into<String>, proration: ProrationBehavior) -> Self {
        Self {
            product_id: Some(product_id.into()),
            proration_behavior: Some(proration),
            ..Default::default()
        }
    }

    pub fn apply_discount(discount_id: impl Into<String>) -> Self {
        Self {
            discount_id: Some(discount_id.into()),
            ..Default::default()
        }
    }

    /// Cancel at the end of the current period (`true`) or undo a scheduled cancellation.
    pub fn cancel_at_period_end(cancel: bool) -> Self {
        Self {
            cancel_at_period_end: Some(cancel),
            ..Default::default()
        }
    }

    pub fn reason(mut self, reason: CancellationReason) -> Self {
        self.customer_cancellation_reason = Some(reason);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.customer_cancellation_comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionListQuery {
    filter: ListFilter,
    product_ids: Vec<String>,
    customer_ids: Vec<String>,
    external_customer_ids: Vec<String>,
    discount_ids: Vec<String>,
    active: Option<bool>,
}

impl SubscriptionListQuery {
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

    pub fn external_customer_id(mut self, id: impl Into<String>) -> Self {
        self.external_customer_ids.push(id.into());
        self
    }

    pub fn discount_id(mut self, id: impl Into<String>) -> Self {
        self.discount_ids.push(id.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
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

impl ListQuery for SubscriptionListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params
            .push_all("product_id", &self.product_ids)
            .push_all("customer_id", &self.customer_ids)
            .push_all("external_customer_id", &self.external_customer_ids)
            .push_all("discount_id", &self.discount_ids)
            .push_opt("active", self.active);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionsApi {
    context: Arc<PolarContext>,
}

impl SubscriptionsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn list(
        &self,
        query: &SubscriptionListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Subscription>> {
        self.context.list(SUBSCRIPTIONS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &SubscriptionListQuery,
    ) -> impl Stream<Item = PolarResult<Subscription>> + Send + 'static {
        self.context
            .list_all(self.api_name(), SUBSCRIPTIONS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Subscription> {
        self.context
            .client
            .get(&resource_path(SUBSCRIPTIONS_PATH, id)?, &[])
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &SubscriptionUpdate,
    ) -> PolarResult<Subscription> {
        self.context
            .client
            .patch(&resource_path(SUBSCRIPTIONS_PATH, id)?, request)
            .await
    }

    /// End the subscription immediately.
    pub async fn revoke(&self, id: &str) -> PolarResult<Subscription> {
        self.context
            .client
            .delete(&resource_path(SUBSCRIPTIONS_PATH, id)?)
            .await
    }
}

impl PolarApi for SubscriptionsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "subscriptions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_deserialize() {
        let json = r#"{
            "id": "sub_1",
            "created_at": "2024-01-01T00:00:00Z",
            "amount": 1500,
            "currency": "usd",
            "recurring_interval": "month",
            "status": "trialing",
            "current_period_start": "2024-01-01T00:00:00Z",
            "current_period_end": "2024-02-01T00:00:00Z",
            "cancel_at_period_end": true,
            "customer_id": "cus_1",
            "product_id": "prod_1",
            "customer_cancellation_reason": "too_expensive",
            "metadata": {}
        }"#;

        let subscription: Subscription = serde_json::from_str(json).unwrap();
        assert!(subscription.status.is_active());
        assert_eq!(
            subscription.customer_cancellation_reason,
            Some(CancellationReason::TooExpensive)
        );
        assert!(subscription.customer.is_none());
    }

    #[test]
    fn test_update_bodies() {
        let change = SubscriptionUpdate::change_product("prod_2", ProrationBehavior::Prorate);
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            serde_json::json!({"product_id": "prod_2", "proration_behavior": "prorate"})
        );

        let cancel = SubscriptionUpdate::cancel_at_period_end(true)
            .reason(CancellationReason::Unused)
            .comment("not needed");
        assert_eq!(
            serde_json::to_value(&cancel).unwrap(),
            serde_json::json!({
                "cancel_at_period_end": true,
                "customer_cancellation_reason": "unused",
                "customer_cancellation_comment": "not needed"
            })
        );
    }

    #[test]
    fn test_list_query() {
        let pairs = SubscriptionListQuery::new()
            .external_customer_id("user_42")
            .active(true)
            .to_query()
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("external_customer_id".to_string(), "user_42".to_string()),
                ("active".to_string(), "true".to_string()),
            ]
        );
    }
}
