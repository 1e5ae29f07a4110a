//! Events API
//!
//! Usage events ingested for billing (metered prices, meters) together with
//! the system events Polar records on its own.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, ListFilter, Metadata};
use super::{PolarApi, PolarContext};
use crate::error::{PolarError, PolarResult};
use crate::pagination::{ListResource, PageParams};
use crate::query::{check_range, ListQuery, QueryParams};

const EVENTS_PATH: &str = "/v1/events/";
const INGEST_PATH: &str = "/v1/events/ingest";
const NAMES_PATH: &str = "/v1/events/names";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    System,
    User,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventSource::System => "system",
            EventSource::User => "user",
        })
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub source: EventSource,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub external_customer_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// An event to ingest. It must reference a customer, by Polar ID or external ID.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct EventCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_customer_id: Option<String>,
    /// Defaults to the ingestion time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl EventCreate {
    pub fn for_customer(name: impl Into<String>, customer_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            customer_id: Some(customer_id.into()),
            external_customer_id: None,
            timestamp: None,
            organization_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn for_external_customer(
        name: impl Into<String>,
        external_customer_id: impl Into<String>,
    ) -> Self {
        Self {
            customer_id: None,
            external_customer_id: Some(external_customer_id.into()),
            ..Self::for_customer(name, String::new())
        }
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
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

#[derive(Debug, Serialize)]
struct EventsIngest<'a> {
    events: &'a [EventCreate],
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EventsIngestResponse {
    /// Number of events stored
    #[serde(default)]
    pub inserted: u64,
}

/// A distinct event name with its occurrence statistics.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventName {
    pub name: String,
    pub source: EventSource,
    #[serde(default)]
    pub occurrences: u64,
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct EventListQuery {
    filter: ListFilter,
    customer_ids: Vec<String>,
    external_customer_ids: Vec<String>,
    meter_id: Option<String>,
    names: Vec<String>,
    sources: Vec<EventSource>,
    start_timestamp: Option<DateTime<Utc>>,
    end_timestamp: Option<DateTime<Utc>>,
}

impl EventListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
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

    /// Only events matching this meter's filter.
    pub fn meter_id(mut self, id: impl Into<String>) -> Self {
        self.meter_id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn source(mut self, source: EventSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn start_timestamp(mut self, start: DateTime<Utc>) -> Self {
        self.start_timestamp = Some(start);
        self
    }

    pub fn end_timestamp(mut self, end: DateTime<Utc>) -> Self {
        self.end_timestamp = Some(end);
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

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.metadata.insert(key.into(), value.into());
        self
    }
}

impl ListQuery for EventListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        check_range(
            self.start_timestamp.as_ref(),
            self.end_timestamp.as_ref(),
            "start_timestamp",
            "end_timestamp",
        )?;

        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params
            .push_all("customer_id", &self.customer_ids)
            .push_all("external_customer_id", &self.external_customer_ids)
            .push_opt("meter_id", self.meter_id.as_deref())
            .push_all("name", &self.names)
            .push_all("source", &self.sources)
            .push_datetime("start_timestamp", self.start_timestamp)
            .push_datetime("end_timestamp", self.end_timestamp);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventNameListQuery {
    filter: ListFilter,
    customer_ids: Vec<String>,
    external_customer_ids: Vec<String>,
    sources: Vec<EventSource>,
}

impl EventNameListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
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

    pub fn source(mut self, source: EventSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.filter.query = Some(query.into());
        self
    }
}

impl ListQuery for EventNameListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params
            .push_all("customer_id", &self.customer_ids)
            .push_all("external_customer_id", &self.external_customer_ids)
            .push_all("source", &self.sources);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct EventsApi {
    context: Arc<PolarContext>,
}

impl EventsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn list(
        &self,
        query: &EventListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Event>> {
        self.context.list(EVENTS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &EventListQuery,
    ) -> impl Stream<Item = PolarResult<Event>> + Send + 'static {
        self.context.list_all(self.api_name(), EVENTS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Event> {
        self.context
            .client
            .get(&resource_path(EVENTS_PATH, id)?, &[])
            .await
    }

    /// Ingest a batch of events.
    ///
    /// # Errors
    /// `PolarError::Validation` without a request when an event names
    /// neither `customer_id` nor `external_customer_id`.
    pub async fn ingest(&self, events: &[EventCreate]) -> PolarResult<EventsIngestResponse> {
        if let Some(index) = events
            .iter()
            .position(|e| e.customer_id.is_none() && e.external_customer_id.is_none())
        {
            return Err(PolarError::invalid(
                &format!("events.{index}"),
                "customer_id or external_customer_id is required",
            ));
        }
        self.context
            .client
            .post(INGEST_PATH, &EventsIngest { events })
            .await
    }

    /// One page of distinct event names.
    pub async fn list_names(
        &self,
        query: &EventNameListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<EventName>> {
        self.context.list(NAMES_PATH, query, page).await
    }

    pub fn list_all_names(
        &self,
        query: &EventNameListQuery,
    ) -> impl Stream<Item = PolarResult<EventName>> + Send + 'static {
        self.context.list_all(self.api_name(), NAMES_PATH, query)
    }
}

impl PolarApi for EventsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "events"
    }
}
