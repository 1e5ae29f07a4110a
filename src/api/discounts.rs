//! Discounts API

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, ListFilter, Metadata};
use super::products::Product;
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{check_range, ListQuery, QueryParams};

const DISCOUNTS_PATH: &str = "/v1/discounts/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountDuration {
    Once,
    Forever,
    Repeating,
}

impl fmt::Display for DiscountDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscountDuration::Once => "once",
            DiscountDuration::Forever => "forever",
            DiscountDuration::Repeating => "repeating",
        })
    }
}

/// What the discount takes off, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountValue {
    /// Fixed amount in cents
    Fixed { amount: i64, currency: String },
    /// 1000 = 10%
    Percentage { basis_points: u32 },
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Discount {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(flatten)]
    pub value: DiscountValue,
    pub duration: DiscountDuration,
    #[serde(default)]
    pub duration_in_months: Option<u32>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_redemptions: Option<u32>,
    #[serde(default)]
    pub redemptions_count: u32,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct DiscountCreate {
    pub name: String,
    #[serde(flatten)]
    pub value: DiscountValue,
    pub duration: DiscountDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_redemptions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl DiscountCreate {
    pub fn new(name: impl Into<String>, value: DiscountValue, duration: DiscountDuration) -> Self {
        Self {
            name: name.into(),
            value,
            duration,
            duration_in_months: None,
            code: None,
            starts_at: None,
            ends_at: None,
            max_redemptions: None,
            products: None,
            organization_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn duration_in_months(mut self, months: u32) -> Self {
        self.duration_in_months = Some(months);
        self
    }

    pub fn window(mut self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self.ends_at = Some(ends_at);
        self
    }

    pub fn max_redemptions(mut self, max: u32) -> Self {
        self.max_redemptions = Some(max);
        self
    }

    pub fn products(mut self, products: Vec<String>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    fn validate(&self) -> PolarResult<()> {
        check_range(
            self.starts_at.as_ref(),
            self.ends_at.as_ref(),
            "starts_at",
            "ends_at",
        )
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_redemptions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl DiscountUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ends_at(mut self, ends_at: DateTime<Utc>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    pub fn starts_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    pub fn max_redemptions(mut self, max: u32) -> Self {
        self.max_redemptions = Some(max);
        self
    }

    fn validate(&self) -> PolarResult<()> {
        check_range(
            self.starts_at.as_ref(),
            self.ends_at.as_ref(),
            "starts_at",
            "ends_at",
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscountListQuery {
    filter: ListFilter,
}

impl DiscountListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }

    /// Search on name or code.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.filter.query = Some(query.into());
        self
    }

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }
}

impl ListQuery for DiscountListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct DiscountsApi {
    context: Arc<PolarContext>,
}

impl DiscountsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    /// # Errors
    /// `PolarError::Validation` without a request when `starts_at` is after `ends_at`.
    pub async fn create(&self, request: &DiscountCreate) -> PolarResult<Discount> {
        request.validate()?;
        self.context.client.post(DISCOUNTS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &DiscountListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Discount>> {
        self.context.list(DISCOUNTS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &DiscountListQuery,
    ) -> impl Stream<Item = PolarResult<Discount>> + Send + 'static {
        self.context.list_all(self.api_name(), DISCOUNTS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Discount> {
        self.context
            .client
            .get(&resource_path(DISCOUNTS_PATH, id)?, &[])
            .await
    }

    pub async fn update(&self, id: &str, request: &DiscountUpdate) -> PolarResult<Discount> {
        request.validate()?;
        self.context
            .client
            .patch(&resource_path(DISCOUNTS_PATH, id)?, request)
            .await
    }

    pub async fn delete(&self, id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(DISCOUNTS_PATH, id)?)
            .await
    }
}

impl PolarApi for DiscountsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "discounts"
    }
}
