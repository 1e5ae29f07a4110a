//! Types shared across resources
//!
//! - [`Metadata`] / [`MetadataValue`] for the key-value metadata most resources carry
//! - [`Address`] for billing addresses
//! - [`TimeInterval`] for metrics and meter quantity buckets
//! - [`ListFilter`] for the filters almost every list endpoint accepts
//!
//! ## Usage
//!
//! ```rust
//! use polar_sdk::api::common::{Metadata, MetadataValue};
//!
//! let mut metadata = Metadata::new();
//! metadata.insert("plan".to_string(), "pro".into());
//! metadata.insert("seats".to_string(), 5.into());
//!
//! let json = serde_json::to_string(&metadata).unwrap();
//! assert_eq!(json, r#"{"plan":"pro","seats":5}"#);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PolarError, PolarResult};
use crate::query::QueryParams;
use crate::utils::encode_path_segment;

/// A metadata value: string, integer, float or boolean.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => f.write_str(s),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(x) => write!(f, "{x}"),
            MetadataValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Integer(value.into())
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Boolean(value)
    }
}

/// String-keyed metadata attached to customers, products, checkouts, ...
pub type Metadata = BTreeMap<String, MetadataValue>;

#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

impl Address {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            ..Default::default()
        }
    }
}

/// Bucket size of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Year,
    Month,
    Week,
    Day,
    Hour,
}

impl TimeInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInterval::Year => "year",
            TimeInterval::Month => "month",
            TimeInterval::Week => "week",
            TimeInterval::Day => "day",
            TimeInterval::Hour => "hour",
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters shared by most list endpoints.
///
/// Resource query types embed this and expose fluent setters for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub organization_ids: Vec<String>,
    pub query: Option<String>,
    /// Sort keys, `-` prefix for descending, e.g. `-created_at`
    pub sorting: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ListFilter {
    pub(crate) fn apply(&self, params: &mut QueryParams) {
        params
            .push_all("organization_id", &self.organization_ids)
            .push_opt("query", self.query.as_deref())
            .push_all("sorting", &self.sorting)
            .push_metadata(&self.metadata);
    }
}

/// `value` percent-encoded as a single path segment.
///
/// Empty values and the dot segments `.`/`..` are rejected: URL parsing would
/// fold them into a different route, even when escaped.
pub(crate) fn path_segment(field: &str, value: &str) -> PolarResult<String> {
    if value.is_empty() {
        return Err(PolarError::invalid(field, "must not be empty"));
    }
    if value == "." || value == ".." {
        return Err(PolarError::invalid(field, "must not be a dot segment"));
    }
    Ok(encode_path_segment(value))
}

/// `{base}{id}` with `id` as a single path segment.
pub(crate) fn resource_path(base: &str, id: &str) -> PolarResult<String> {
    Ok(format!("{base}{}", path_segment("id", id)?))
}
