//! Retry middleware for transient failures.
//!
//! Retries requests whose failure is likely to clear up on a later attempt:
//!
//! - transport errors and timeouts
//! - HTTP 5xx responses
//! - HTTP 429, honoring the `Retry-After` header when present
//!
//! Everything else (validation, auth, not-found, ...) is returned on the first
//! attempt.
//!
//! # Non-Idempotent Requests
//!
//! POST and PATCH requests are sent once by default, since a retry could
//! create a duplicate resource. Use [`RetryMiddleware::with_retry_non_idempotent`]
//! to opt in.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use log::warn;
use tokio::time::sleep;
use tower::{Layer, Service, ServiceExt};

use crate::error::PolarError;
use crate::utils::jittered_delay;

pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;
pub(crate) const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Middleware that retries requests failing with a transient [`PolarError`].
#[derive(Debug, Clone)]
pub struct RetryMiddleware {
    max_retries: u32,
    initial_delay: Duration,
    retry_non_idempotent: bool,
}

impl RetryMiddleware {
    /// Default: 3 retries, 500ms initial delay, idempotent requests only.
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            retry_non_idempotent: false,
        }
    }

    /// Number of retries after the first attempt. `0` disables retrying.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Delay before the first retry; doubles on every subsequent retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Also retry POST/PATCH requests.
    pub fn with_retry_non_idempotent(mut self, retry: bool) -> Self {
        self.retry_non_idempotent = retry;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Delay before retry number `attempt` (0-based) for the given error,
    /// or `None` when the error should be returned to the caller.
    pub fn next_delay(&self, error: &PolarError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries || !error.is_transient() {
            return None;
        }
        Some(
            error
                .retry_after()
                .unwrap_or_else(|| jittered_delay(self.initial_delay, attempt)),
        )
    }
}

impl Default for RetryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RetryMiddleware {
    type Service = RetryMiddlewareService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryMiddlewareService {
            inner,
            policy: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryMiddlewareService<S> {
    inner: S,
    policy: RetryMiddleware,
}

/// Requests the retry middleware knows how to replay.
pub trait RetryableRequest: Sized {
    /// Returns true if repeating the request has no additional side effects.
    fn is_idempotent(&self) -> bool;

    /// A copy to send on the next attempt, or `None` if the body cannot be replayed.
    fn try_clone_request(&self) -> Option<Self>;

    /// Short description used in log lines.
    fn describe(&self) -> String {
        String::new()
    }
}

impl RetryableRequest for reqwest::Request {
    fn is_idempotent(&self) -> bool {
        !matches!(
            self.method(),
            &reqwest::Method::POST | &reqwest::Method::PATCH
        )
    }

    fn try_clone_request(&self) -> Option<Self> {
        self.try_clone()
    }

    fn describe(&self) -> String {
        format!("{} {}", self.method(), self.url().path())
    }
}

impl<S, R> Service<R> for RetryMiddlewareService<S>
where
    S: Service<R, Error = PolarError> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send,
    R: RetryableRequest + Send + 'static,
{
    type Response = S::Response;
    type Error = PolarError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let inner = self.inner.clone();
        let policy = self.policy.clone();

        Box::pin(async move {
            let replayable = req.is_idempotent() || policy.retry_non_idempotent;
            let mut attempt: u32 = 0;

            loop {
                let current = if replayable && attempt < policy.max_retries {
                    req.try_clone_request()
                } else {
                    None
                };

                // Last permitted attempt or an unreplayable request: hand over the original.
                let Some(current) = current else {
                    return inner.oneshot(req).await;
                };

                match inner.clone().oneshot(current).await {
                    Ok(response) => return Ok(response),
                    Err(error) => match policy.next_delay(&error, attempt) {
                        Some(delay) => {
                            warn!(
                                "[Polar] retrying {} after {:?} (attempt {}/{}): {}",
                                req.describe(),
                                delay,
                                attempt + 1,
                                policy.max_retries,
                                error
                            );
                            sleep(delay).await;
                            attempt += 1;
                        }
                        None => return Err(error),
                    },
                }
            }
        })
    }
}
