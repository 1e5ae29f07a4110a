//! Polar HTTP Client
//!
//! Low-level JSON client shared by every resource API. Requests built here
//! are sent through the middleware pipeline (retry, rate limit, logging,
//! bearer auth, status classification).

use std::fmt;

use reqwest::{Client, Method, Request, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use super::transport::Executor;
use crate::error::{HttpError, PolarError, PolarResult};
use crate::types::Environment;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const USER_AGENT: &str = concat!("polar-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Polar API Client
///
/// Cheap to clone; clones share the connection pool and the rate limiter.
/// Build one through [`Polar::builder`](crate::Polar::builder) or
/// [`PolarBuilder::build_client`](super::PolarBuilder::build_client).
#[derive(Clone)]
pub struct PolarClient {
    http: Client,
    base_url: String,
    environment: Option<Environment>,
    pipeline: Executor<PolarError>,
}

impl fmt::Debug for PolarClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolarClient")
            .field("base_url", &self.base_url)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl PolarClient {
    pub(crate) fn new(
        http: Client,
        base_url: String,
        environment: Option<Environment>,
        pipeline: Executor<PolarError>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            environment,
            pipeline,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The environment the base URL was derived from, `None` for a custom URL.
    pub fn environment(&self) -> Option<Environment> {
        self.environment
    }

    /// Start a request to `path` (e.g. `/v1/customers/`) relative to the base URL.
    ///
    /// Send it with [`send`](Self::send) so it goes through the pipeline.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request through the pipeline and decode the JSON response.
    ///
    /// An empty body decodes as JSON `null`, so `T = ()` works for
    /// `204 No Content` responses.
    ///
    /// # Errors
    /// - Typed status errors (`Validation`, `NotFound`, ...) for non-2xx responses
    /// - `PolarError::Http` for transport or decode failures
    /// - `PolarError::Timeout` when the request timed out
    pub async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PolarResult<T> {
        let request = builder.build()?;
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: Request) -> PolarResult<T> {
        let response = (self.pipeline)(request).await?;
        let bytes = response.bytes().await?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };

        serde_json::from_slice(body).map_err(|e| PolarError::Http(HttpError::Decode(e.to_string())))
    }

    /// Make a GET request with query parameters
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> PolarResult<T> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> PolarResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// Make a POST request without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> PolarResult<T> {
        self.send(self.request(Method::POST, path)).await
    }

    /// Make a POST request with a form-urlencoded body
    pub async fn post_form<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        form: &B,
    ) -> PolarResult<T> {
        self.send(self.request(Method::POST, path).form(form)).await
    }

    /// Make a PATCH request with a JSON body
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> PolarResult<T> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> PolarResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> PolarResult<T> {
        self.send(self.request(Method::DELETE, path)).await
    }

    /// Make a DELETE request, discarding whatever body comes back
    pub async fn delete_no_content(&self, path: &str) -> PolarResult<()> {
        self.delete::<IgnoredAny>(path).await.map(|_| ())
    }

    /// Make a POST request with a JSON body, discarding whatever body comes back
    pub async fn post_no_content<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> PolarResult<()> {
        self.post::<IgnoredAny, B>(path, body).await.map(|_| ())
    }
}
