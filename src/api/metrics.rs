//! Metrics API
//!
//! Time series of revenue, orders, subscriptions and usage, bucketed by a
//! [`TimeInterval`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::TimeInterval;
use super::orders::ProductBillingType;
use super::{PolarApi, PolarContext};
use crate::error::{PolarError, PolarResult};
use crate::query::{check_range, QueryParams};

const METRICS_PATH: &str = "/v1/metrics/";
const LIMITS_PATH: &str = "/v1/metrics/limits";

/// Description of one metric column.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metric {
    pub slug: String,
    pub display_name: String,
    /// `scalar`, `currency` or `percentage`
    #[serde(rename = "type")]
    pub metric_type: String,
}

/// One bucket of the series. Values are keyed by metric slug.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricPeriod {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl MetricPeriod {
    pub fn value(&self, slug: &str) -> Option<f64> {
        self.values.get(slug).and_then(Value::as_f64)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub periods: Vec<MetricPeriod>,
    #[serde(default)]
    pub totals: BTreeMap<String, Value>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Metric>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct IntervalLimit {
    /// Widest date range accepted for the interval
    pub max_days: u32,
}

/// Date bounds accepted by [`MetricsApi::get`].
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsLimits {
    pub min_date: NaiveDate,
    #[serde(default)]
    pub intervals: BTreeMap<String, IntervalLimit>,
}

impl MetricsLimits {
    pub fn max_days(&self, interval: TimeInterval) -> Option<u32> {
        self.intervals.get(interval.as_str()).map(|l| l.max_days)
    }
}

/// Parameters of a metrics query. `start_date`, `end_date` and `interval`
/// are required.
#[derive(Debug, Clone, Default)]
pub struct MetricsQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    interval: Option<TimeInterval>,
    timezone: Option<String>,
    organization_ids: Vec<String>,
    product_ids: Vec<String>,
    billing_types: Vec<ProductBillingType>,
    customer_ids: Vec<String>,
}

impl MetricsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(start_date: NaiveDate, end_date: NaiveDate, interval: TimeInterval) -> Self {
        Self::new()
            .start_date(start_date)
            .end_date(end_date)
            .interval(interval)
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn interval(mut self, interval: TimeInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// IANA name, e.g. `Europe/Paris`. The server defaults to UTC.
    pub fn timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = Some(tz.into());
        self
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_ids.push(id.into());
        self
    }

    pub fn product_id(mut self, id: impl Into<String>) -> Self {
        self.product_ids.push(id.into());
        self
    }

    pub fn billing_type(mut self, billing_type: ProductBillingType) -> Self {
        self.billing_types.push(billing_type);
        self
    }

    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_ids.push(id.into());
        self
    }

    pub fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let start_date = self
            .start_date
            .ok_or_else(|| PolarError::invalid("start_date", "field required"))?;
        let end_date = self
            .end_date
            .ok_or_else(|| PolarError::invalid("end_date", "field required"))?;
        let interval = self
            .interval
            .ok_or_else(|| PolarError::invalid("interval", "field required"))?;
        check_range(Some(&start_date), Some(&end_date), "start_date", "end_date")?;

        let mut params = QueryParams::new();
        params
            .push_date("start_date", Some(start_date))
            .push_date("end_date", Some(end_date))
            .push("interval", interval)
            .push_opt("timezone", self.timezone.as_deref())
            .push_all("organization_id", &self.organization_ids)
            .push_all("product_id", &self.product_ids)
            .push_all("billing_type", &self.billing_types)
            .push_all("customer_id", &self.customer_ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct MetricsApi {
    context: Arc<PolarContext>,
}

impl MetricsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    /// # Errors
    /// `PolarError::Validation` without a request when a required parameter
    /// is missing or `start_date` is after `end_date`.
    pub async fn get(&self, query: &MetricsQuery) -> PolarResult<MetricsResponse> {
        let params = query.to_query()?;
        self.context.client.get(METRICS_PATH, &params).await
    }

    pub async fn limits(&self) -> PolarResult<MetricsLimits> {
        self.context.client.get(LIMITS_PATH, &[]).await
    }
}

impl PolarApi for MetricsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "metrics"
    }
}
