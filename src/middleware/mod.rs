//! Middleware components for the Polar SDK.
//!
//! Every request sent by [`PolarClient`](crate::client::PolarClient) flows
//! through a Tower stack assembled from these layers, outermost first:
//!
//! - [`RetryMiddleware`] - Retries transient failures with backoff
//! - [`RateLimitMiddleware`] - Requests-per-minute token bucket
//! - [`LoggingMiddleware`] - Logs request/response information
//! - [`AuthMiddleware`] - Injects the bearer token
//!
//! The layers are also usable on their own:
//!
//! ```ignore
//! use tower::ServiceBuilder;
//! use polar_sdk::middleware::{LoggingMiddleware, RateLimitMiddleware, RetryMiddleware};
//!
//! let service = ServiceBuilder::new()
//!     .layer(RetryMiddleware::new())
//!     .layer(RateLimitMiddleware::per_minute(300))
//!     .layer(LoggingMiddleware::new())
//!     .service(inner_service);
//! ```

pub use tower::{Layer, Service, ServiceBuilder};

mod auth;
mod logging;
mod rate_limit;
mod retry;

pub use auth::{AuthMiddleware, AuthMiddlewareService};
pub use logging::{LoggingMiddleware, LoggingMiddlewareService};
pub use rate_limit::{RateLimitMiddleware, RateLimitMiddlewareService, RateLimiter};
pub use retry::{RetryMiddleware, RetryMiddlewareService, RetryableRequest};

pub(crate) use retry::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};
