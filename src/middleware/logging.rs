//! Request logging middleware.
//!
//! One `info!` line per request and one per response:
//!
//! ```text
//! [Polar] GET /v1/customers/?page=1&limit=10
//! [Polar] GET /v1/customers/ -> 200 OK (84ms)
//! ```
//!
//! In verbose mode the same lines go to `debug!` with `>>>`/`<<<` markers.
//! Only the path and query are logged, never headers. Query values of
//! credential-like keys are replaced by `[REDACTED]`.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use http::StatusCode;
use log::{debug, info, warn};
use reqwest::{Request, Response, Url};
use tower::{Layer, Service, ServiceExt};

const REDACTED_KEYS: &[&str] = &[
    "token",
    "access_token",
    "refresh_token",
    "client_secret",
    "customer_session_token",
    "code",
    "key",
];

/// Layer logging each request and its outcome through the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    verbose: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log at `debug` level with request/response markers.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl<S> Layer<S> for LoggingMiddleware {
    type Service = LoggingMiddlewareService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddlewareService {
            inner,
            verbose: self.verbose,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingMiddlewareService<S> {
    inner: S,
    verbose: bool,
}

/// Path and query of `url` with credential values masked.
fn loggable_target(url: &Url) -> String {
    let mut target = url.path().to_string();
    let Some(query) = url.query() else {
        return target;
    };

    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if REDACTED_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)) => {
                format!("{key}=[REDACTED]")
            }
            _ => pair.to_string(),
        })
        .collect();
    target.push('?');
    target.push_str(&masked.join("&"));
    target
}

fn describe_status(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

fn log_outcome(method: &str, path: &str, status: StatusCode, elapsed: Duration, verbose: bool) {
    let status = describe_status(status);
    if verbose {
        debug!("[Polar] <<< {method} {path} {status} ({elapsed:?})");
    } else {
        info!("[Polar] {method} {path} -> {status} ({elapsed:?})");
    }
}

impl<S, Error> Service<Request> for LoggingMiddlewareService<S>
where
    S: Service<Request, Response = Response, Error = Error> + Send + Clone + 'static,
    S::Future: Send,
    Error: Display + Send + 'static,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().to_string();
        let target = loggable_target(req.url());
        let path = req.url().path().to_string();
        let verbose = self.verbose;
        let inner = self.inner.clone();

        Box::pin(async move {
            if verbose {
                debug!("[Polar] >>> {method} {target}");
            } else {
                info!("[Polar] {method} {target}");
            }

            let started = Instant::now();
            let result = inner.oneshot(req).await;
            match &result {
                Ok(response) => {
                    log_outcome(&method, &path, response.status(), started.elapsed(), verbose)
                }
                Err(e) => warn!(
                    "[Polar] {method} {path} failed after {:?}: {e}",
                    started.elapsed()
                ),
            }
            result
        })
    }
}
