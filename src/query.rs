//! Query-string building for list endpoints.
//!
//! Every listable resource has a fluent filter type (for example
//! [`CustomerListQuery`](crate::api::customers::CustomerListQuery)) that
//! implements [`ListQuery`]. Filters are only turned into query pairs when the
//! request is made, at which point known invalid combinations are rejected
//! with [`PolarError::Validation`] before anything is sent.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{PolarError, PolarResult};

/// Converts a filter set into query-string pairs.
pub trait ListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>>;
}

impl ListQuery for () {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

/// Ordered accumulator of query pairs. Repeated keys are kept, which is how the
/// API receives multi-valued filters (`id=a&id=b`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn push_opt<V: Display>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn push_all<I>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        for value in values {
            self.push(key, value);
        }
        self
    }

    /// `YYYY-MM-DD`
    pub fn push_date(&mut self, key: &str, value: Option<NaiveDate>) -> &mut Self {
        self.push_opt(key, value.map(|d| d.format("%Y-%m-%d")))
    }

    /// RFC 3339 in UTC, e.g. `2024-01-31T12:00:00Z`
    pub fn push_datetime(&mut self, key: &str, value: Option<DateTime<Utc>>) -> &mut Self {
        self.push_opt(
            key,
            value.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        )
    }

    /// `metadata[key]=value` pairs.
    pub fn push_metadata(&mut self, metadata: &BTreeMap<String, String>) -> &mut Self {
        for (key, value) in metadata {
            self.pairs
                .push((format!("metadata[{key}]"), value.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

/// Reject a range whose start lies after its end.
pub(crate) fn check_range<T: PartialOrd>(
    start: Option<&T>,
    end: Option<&T>,
    start_field: &str,
    end_field: &str,
) -> PolarResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(PolarError::invalid(
                start_field,
                format!("must not be after {end_field}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_push_keeps_order_and_repeats() {
        let mut params = QueryParams::new();
        params
            .push("organization_id", "org_1")
            .push_all("id", ["a", "b"])
            .push_opt::<&str>("query", None)
            .push("is_archived", false);

        assert_eq!(
            params.clone().into_pairs(),
            vec![
                ("organization_id".to_string(), "org_1".to_string()),
                ("id".to_string(), "a".to_string()),
                ("id".to_string(), "b".to_string()),
                ("is_archived".to_string(), "false".to_string()),
            ]
        );
        assert_eq!(params.get("id"), Some("a"));
    }

    #[test]
    fn test_dates_and_timestamps() {
        let mut params = QueryParams::new();
        params
            .push_date("start_date", NaiveDate::from_ymd_opt(2024, 1, 5))
            .push_datetime(
                "start_timestamp",
                Some(Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()),
            );

        assert_eq!(params.get("start_date"), Some("2024-01-05"));
        assert_eq!(params.get("start_timestamp"), Some("2024-01-31T12:00:00Z"));
    }

    #[test]
    fn test_metadata_pairs() {
        let mut metadata = BTreeMap::new();
        metadata.insert("plan".to_string(), "pro".to_string());
        let mut params = QueryParams::new();
        params.push_metadata(&metadata);
        assert_eq!(params.get("metadata[plan]"), Some("pro"));
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(Some(&1), Some(&2), "start", "end").is_ok());
        assert!(check_range(Some(&2), Some(&2), "start", "end").is_ok());
        assert!(check_range::<i32>(None, Some(&2), "start", "end").is_ok());
        let err = check_range(Some(&3), Some(&2), "start", "end").unwrap_err();
        assert!(err.to_string().contains("must not be after end"));
    }

    #[test]
    fn test_unit_query_is_empty() {
        assert!(().to_query().unwrap().is_empty());
    }
}
