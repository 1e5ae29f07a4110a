//! Polar API trait and context
//!
//! Shared plumbing for the resource clients: one page of a list endpoint,
//! and the lazy stream over every page.

use std::sync::Arc;

use futures::stream::Stream;
use log::debug;
use serde::de::DeserializeOwned;

use crate::client::PolarClient;
use crate::error::PolarResult;
use crate::pagination::{paginate, ListResource, PageParams, MAX_PAGE_LIMIT};
use crate::query::ListQuery;

/// Context holding shared resources for the resource clients.
#[derive(Clone)]
pub struct PolarContext {
    pub(crate) client: Arc<PolarClient>,
}

impl std::fmt::Debug for PolarContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolarContext")
            .field("client", &self.client)
            .finish()
    }
}

impl PolarContext {
    pub fn new(client: Arc<PolarClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PolarClient {
        &self.client
    }

    /// Fetch one page of `path`.
    ///
    /// Filters are validated before the request is sent.
    pub async fn list<T, Q>(
        &self,
        path: &str,
        query: &Q,
        page: PageParams,
    ) -> PolarResult<ListResource<T>>
    where
        T: DeserializeOwned,
        Q: ListQuery + ?Sized,
    {
        page.validate()?;
        let mut pairs = query.to_query()?;
        pairs.extend(page.to_query());
        self.client.get(path, &pairs).await
    }

    /// Lazily stream every item of every page of `path`, 100 items per request.
    ///
    /// Filters are validated once, before the first page; a validation
    /// failure is the only item of the stream.
    pub fn list_all<T, Q>(
        self: &Arc<Self>,
        api_name: &'static str,
        path: impl Into<String>,
        query: &Q,
    ) -> impl Stream<Item = PolarResult<T>> + Send + 'static
    where
        T: DeserializeOwned + Send + 'static,
        Q: ListQuery + ?Sized,
    {
        let context = Arc::clone(self);
        let path: Arc<str> = Arc::from(path.into());
        let (filters, mut invalid) = match query.to_query() {
            Ok(pairs) => (pairs, None),
            Err(e) => (Vec::new(), Some(e)),
        };

        paginate(MAX_PAGE_LIMIT, move |page: PageParams| {
            let context = Arc::clone(&context);
            let path = Arc::clone(&path);
            let mut pairs = filters.clone();
            let invalid = invalid.take();
            async move {
                if let Some(e) = invalid {
                    return Err(e);
                }
                pairs.extend(page.to_query());
                debug!("[Polar] {api_name}: fetching page {} of {}", page.page, path);
                context.client.get::<ListResource<T>>(&path, &pairs).await
            }
        })
    }
}

/// Trait for Polar resource clients.
pub trait PolarApi: Send + Sync {
    /// Get a reference to the shared context
    fn context(&self) -> &PolarContext;

    /// Name of this resource, used in log lines.
    fn api_name(&self) -> &'static str {
        "unknown"
    }
}
