//! Bearer authentication middleware.
//!
//! Sets `Authorization: Bearer <token>` on every outgoing request. The header
//! value is marked sensitive so it is omitted from `Debug` output of the request.
//!
//! # Example
//!
//! ```ignore
//! use tower::ServiceBuilder;
//! use polar_sdk::middleware::AuthMiddleware;
//! use polar_sdk::types::AccessToken;
//!
//! let service = ServiceBuilder::new()
//!     .layer(AuthMiddleware::new(AccessToken::new("polar_oat_...")?))
//!     .service(transport);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;
use tower::{Layer, Service, ServiceExt};

use crate::error::PolarError;
use crate::types::AccessToken;

/// Middleware that injects the bearer token into requests.
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    token: AccessToken,
}

impl AuthMiddleware {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    pub(crate) fn header_value(token: &AccessToken) -> Result<HeaderValue, PolarError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
            .map_err(|e| PolarError::Config(format!("access token is not a valid header: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl<S> Layer<S> for AuthMiddleware {
    type Service = AuthMiddlewareService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddlewareService {
            inner,
            token: self.token.clone(),
        }
    }
}

/// Service created by [`AuthMiddleware`].
#[derive(Debug, Clone)]
pub struct AuthMiddlewareService<S> {
    inner: S,
    token: AccessToken,
}

impl<S> Service<Request> for AuthMiddlewareService<S>
where
    S: Service<Request, Error = PolarError> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send,
{
    type Response = S::Response;
    type Error = PolarError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let inner = self.inner.clone();
        let header = AuthMiddleware::header_value(&self.token);

        Box::pin(async move {
            // An explicit Authorization header (e.g. a customer session token) wins.
            if !req.headers().contains_key(AUTHORIZATION) {
                req.headers_mut().insert(AUTHORIZATION, header?);
            }
            inner.oneshot(req).await
        })
    }
}
