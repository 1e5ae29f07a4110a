//! Webhook endpoints API
//!
//! Manages the endpoints Polar delivers events to and inspects past
//! deliveries. Verifying inbound deliveries is done by
//! [`crate::webhooks::Webhook`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, ListFilter};
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{check_range, ListQuery, QueryParams};

const ENDPOINTS_PATH: &str = "/v1/webhooks/endpoints";
const ENDPOINT_PATH: &str = "/v1/webhooks/endpoints/";
const DELIVERIES_PATH: &str = "/v1/webhooks/deliveries";
const EVENTS_PATH: &str = "/v1/webhooks/events/";

/// Payload format sent to the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookFormat {
    #[default]
    Raw,
    Discord,
    Slack,
}

#[non_exhaustive]
#[derive(Clone, Deserialize, Serialize)]
pub struct WebhookEndpoint {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    pub url: String,
    #[serde(default)]
    pub format: WebhookFormat,
    /// Signing secret for deliveries to this endpoint
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub organization_id: String,
    /// Subscribed event types, e.g. `order.paid`
    #[serde(default)]
    pub events: Vec<String>,
}

impl fmt::Debug for WebhookEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookEndpoint")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("format", &self.format)
            .field("secret", &"[REDACTED]")
            .field("organization_id", &self.organization_id)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEndpointCreate {
    pub url: String,
    pub format: WebhookFormat,
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl WebhookEndpointCreate {
    pub fn new<I, S>(url: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url: url.into(),
            format: WebhookFormat::Raw,
            events: events.into_iter().map(Into::into).collect(),
            secret: None,
            organization_id: None,
        }
    }

    pub fn format(mut self, format: WebhookFormat) -> Self {
        self.format = format;
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookEndpointUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<WebhookFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
}

impl WebhookEndpointUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn events(mut self, events: Vec<String>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}

/// The event carried by a delivery.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookEvent {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_http_code: Option<u16>,
    #[serde(default)]
    pub succeeded: Option<bool>,
    /// Raw JSON body as sent
    #[serde(default)]
    pub payload: String,
}

/// One delivery attempt of an event to an endpoint.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookDelivery {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default)]
    pub http_code: Option<u16>,
    #[serde(default)]
    pub response: Option<String>,
    pub webhook_event: WebhookEvent,
}

#[derive(Debug, Clone, Default)]
pub struct WebhookEndpointListQuery {
    filter: ListFilter,
}

impl WebhookEndpointListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }
}

impl ListQuery for WebhookEndpointListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone, Default)]
pub struct WebhookDeliveryListQuery {
    endpoint_ids: Vec<String>,
    start_timestamp: Option<DateTime<Utc>>,
    end_timestamp: Option<DateTime<Utc>>,
}

impl WebhookDeliveryListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint_id(mut self, id: impl Into<String>) -> Self {
        self.endpoint_ids.push(id.into());
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
}

impl ListQuery for WebhookDeliveryListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        check_range(
            self.start_timestamp.as_ref(),
            self.end_timestamp.as_ref(),
            "start_timestamp",
            "end_timestamp",
        )?;

        let mut params = QueryParams::new();
        params
            .push_all("endpoint_id", &self.endpoint_ids)
            .push_datetime("start_timestamp", self.start_timestamp)
            .push_datetime("end_timestamp", self.end_timestamp);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct WebhooksApi {
    context: Arc<PolarContext>,
}

impl WebhooksApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn list_endpoints(
        &self,
        query: &WebhookEndpointListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<WebhookEndpoint>> {
        self.context.list(ENDPOINTS_PATH, query, page).await
    }

    pub fn list_all_endpoints(
        &self,
        query: &WebhookEndpointListQuery,
    ) -> impl Stream<Item = PolarResult<WebhookEndpoint>> + Send + 'static {
        self.context.list_all(self.api_name(), ENDPOINTS_PATH, query)
    }

    pub async fn create_endpoint(
        &self,
        request: &WebhookEndpointCreate,
    ) -> PolarResult<WebhookEndpoint> {
        self.context.client.post(ENDPOINTS_PATH, request).await
    }

    pub async fn get_endpoint(&self, id: &str) -> PolarResult<WebhookEndpoint> {
        self.context
            .client
            .get(&resource_path(ENDPOINT_PATH, id)?, &[])
            .await
    }

    pub async fn update_endpoint(
        &self,
        id: &str,
        request: &WebhookEndpointUpdate,
    ) -> PolarResult<WebhookEndpoint> {
        self.context
            .client
            .patch(&resource_path(ENDPOINT_PATH, id)?, request)
            .await
    }

    pub async fn delete_endpoint(&self, id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(ENDPOINT_PATH, id)?)
            .await
    }

    pub async fn list_deliveries(
        &self,
        query: &WebhookDeliveryListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<WebhookDelivery>> {
        self.context.list(DELIVERIES_PATH, query, page).await
    }

    pub fn list_all_deliveries(
        &self,
        query: &WebhookDeliveryListQuery,
    ) -> impl Stream<Item = PolarResult<WebhookDelivery>> + Send + 'static {
        self.context.list_all(self.api_name(), DELIVERIES_PATH, query)
    }

    /// Schedule a new delivery of a past event.
    pub async fn redeliver_event(&self, event_id: &str) -> PolarResult<()> {
        let path = format!("{}/redeliver", resource_path(EVENTS_PATH, event_id)?);
        self.context.client.post_empty::<IgnoredAny>(&path).await?;
        Ok(())
    }
}

impl PolarApi for WebhooksApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "webhooks"
    }
}
