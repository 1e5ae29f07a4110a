//! Meters API
//!
//! A meter filters ingested events and aggregates them into a billable
//! quantity.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{resource_path, ListFilter, Metadata, TimeInterval};
use super::{PolarApi, PolarContext};
use crate::error::{PolarError, PolarResult};
use crate::pagination::{ListResource, PageParams};
use crate::query::{check_range, ListQuery, QueryParams};

const METERS_PATH: &str = "/v1/meters/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterConjunction {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    #[serde(rename = "not like")]
    NotLike,
}

/// A single condition on an event property, e.g. `name eq "api_call"`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterClause {
    pub property: String,
    pub operator: FilterOperator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    Clause(FilterClause),
    Group(MeterFilter),
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MeterFilter {
    #[serde(default)]
    pub conjunction: FilterConjunction,
    #[serde(default)]
    pub clauses: Vec<FilterNode>,
}

impl MeterFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn any() -> Self {
        Self {
            conjunction: FilterConjunction::Or,
            clauses: Vec::new(),
        }
    }

    pub fn clause(
        mut self,
        property: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.clauses.push(FilterNode::Clause(FilterClause {
            property: property.into(),
            operator,
            value: value.into(),
        }));
        self
    }

    pub fn group(mut self, filter: MeterFilter) -> Self {
        self.clauses.push(FilterNode::Group(filter));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "func", rename_all = "lowercase")]
pub enum MeterAggregation {
    Count,
    Sum { property: String },
    Max { property: String },
    Min { property: String },
    Avg { property: String },
    Unique { property: String },
}

impl MeterAggregation {
    pub fn func(&self) -> &'static str {
        match self {
            MeterAggregation::Count => "count",
            MeterAggregation::Sum { .. } => "sum",
            MeterAggregation::Max { .. } => "max",
            MeterAggregation::Min { .. } => "min",
            MeterAggregation::Avg { .. } => "avg",
            MeterAggregation::Unique { .. } => "unique",
        }
    }
}

impl fmt::Display for MeterAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.func())
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Meter {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    pub name: String,
    pub filter: MeterFilter,
    pub aggregation: MeterAggregation,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct MeterCreate {
    pub name: String,
    pub filter: MeterFilter,
    pub aggregation: MeterAggregation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl MeterCreate {
    pub fn new(
        name: impl Into<String>,
        filter: MeterFilter,
        aggregation: MeterAggregation,
    ) -> Self {
        Self {
            name: name.into(),
            filter,
            aggregation,
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

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct MeterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<MeterFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<MeterAggregation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl MeterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn filter(mut self, filter: MeterFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn aggregation(mut self, aggregation: MeterAggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.is_archived = Some(archived);
        self
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MeterQuantity {
    pub timestamp: DateTime<Utc>,
    pub quantity: f64,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeterQuantities {
    #[serde(default)]
    pub quantities: Vec<MeterQuantity>,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MeterListQuery {
    filter: ListFilter,
    archived: Option<bool>,
}

impl MeterListQuery {
    pub fn new() -> Self {
        Self::default()
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
        self.archived = Some(archived);
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

impl ListQuery for MeterListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params.push_opt("is_archived", self.archived);
        Ok(params.into_pairs())
    }
}

/// Window and bucketing of a quantities query. All three are required.
#[derive(Debug, Clone)]
pub struct MeterQuantitiesQuery {
    start_timestamp: DateTime<Utc>,
    end_timestamp: DateTime<Utc>,
    interval: TimeInterval,
    customer_ids: Vec<String>,
    external_customer_ids: Vec<String>,
}

impl MeterQuantitiesQuery {
    pub fn new(
        start_timestamp: DateTime<Utc>,
        end_timestamp: DateTime<Utc>,
        interval: TimeInterval,
    ) -> Self {
        Self {
            start_timestamp,
            end_timestamp,
            interval,
            customer_ids: Vec::new(),
            external_customer_ids: Vec::new(),
        }
    }

    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_ids.push(id.into());
        self
    }

    pub fn external_customer_id(mut self, id: impl Into<String>) -> Self {
        self.external_customer_ids.push(id.into());
        self
    }

    pub fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        check_range(
            Some(&self.start_timestamp),
            Some(&self.end_timestamp),
            "start_timestamp",
            "end_timestamp",
        )?;

        let mut params = QueryParams::new();
        params
            .push_datetime("start_timestamp", Some(self.start_timestamp))
            .push_datetime("end_timestamp", Some(self.end_timestamp))
            .push("interval", self.interval)
            .push_all("customer_id", &self.customer_ids)
            .push_all("external_customer_id", &self.external_customer_ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct MetersApi {
    context: Arc<PolarContext>,
}

impl MetersApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    /// # Errors
    /// `PolarError::Validation` without a request when the aggregation needs
    /// a property and none is given.
    pub async fn create(&self, request: &MeterCreate) -> PolarResult<Meter> {
        check_aggregation(&request.aggregation)?;
        self.context.client.post(METERS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &MeterListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Meter>> {
        self.context.list(METERS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &MeterListQuery,
    ) -> impl Stream<Item = PolarResult<Meter>> + Send + 'static {
        self.context.list_all(self.api_name(), METERS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Meter> {
        self.context
            .client
            .get(&resource_path(METERS_PATH, id)?, &[])
            .await
    }

    pub async fn update(&self, id: &str, request: &MeterUpdate) -> PolarResult<Meter> {
        if let Some(aggregation) = &request.aggregation {
            check_aggregation(aggregation)?;
        }
        self.context
            .client
            .patch(&resource_path(METERS_PATH, id)?, request)
            .await
    }

    /// Aggregated quantities over a window.
    ///
    /// # Errors
    /// `PolarError::Validation` without a request when `start_timestamp` is
    /// after `end_timestamp`.
    pub async fn quantities(
        &self,
        id: &str,
        query: &MeterQuantitiesQuery,
    ) -> PolarResult<MeterQuantities> {
        let params = query.to_query()?;
        let path = format!("{}/quantities", resource_path(METERS_PATH, id)?);
        self.context.client.get(&path, &params).await
    }
}

fn check_aggregation(aggregation: &MeterAggregation) -> PolarResult<()> {
    let property = match aggregation {
        MeterAggregation::Count => return Ok(()),
        MeterAggregation::Sum { property }
        | MeterAggregation::Max { property }
        | MeterAggregation::Min { property }
        | MeterAggregation::Avg { property }
        | MeterAggregation::Unique { property } => property,
    };
    if property.trim().is_empty() {
        return Err(PolarError::invalid(
            "aggregation.property",
            format!("required for {aggregation}"),
        ));
    }
    Ok(())
}

impl PolarApi for MetersApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "meters"
    }
}
