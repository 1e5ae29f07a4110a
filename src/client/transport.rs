use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::RETRY_AFTER;
use reqwest::{Client, Request, Response};
use tower::{Service, ServiceExt};

use crate::error::{PolarError, PolarResult};
use crate::utils::parse_retry_after;

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Type-erased request executor.
pub(crate) type Executor<E> = Arc<dyn Fn(Request) -> BoxFuture<Response, E> + Send + Sync>;

/// Raw HTTP transport.
///
/// Sends the request as-is: no authentication, no status handling. This is
/// the service wrapped by layers passed to
/// [`PolarBuilder::with_middleware`](super::PolarBuilder::with_middleware).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub(crate) fn new(http: Client) -> Self {
        Self { http }
    }
}

impl Service<Request> for HttpTransport {
    type Response = Response;
    type Error = reqwest::Error;
    type Future = BoxFuture<Response, reqwest::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let client = self.http.clone();
        Box::pin(async move { client.execute(req).await })
    }
}

/// Turns non-2xx responses into typed [`PolarError`]s.
#[derive(Clone)]
pub(crate) struct StatusCheck {
    raw: Executor<reqwest::Error>,
}

impl StatusCheck {
    pub(crate) fn new(raw: Executor<reqwest::Error>) -> Self {
        Self { raw }
    }

    async fn check(response: Response) -> PolarResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.unwrap_or_default();

        Err(PolarError::from_response(
            status.as_u16(),
            &body,
            retry_after,
        ))
    }
}

impl Service<Request> for StatusCheck {
    type Response = Response;
    type Error = PolarError;
    type Future = BoxFuture<Response, PolarError>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let raw = Arc::clone(&self.raw);
        Box::pin(async move {
            let response = (raw)(req).await?;
            Self::check(response).await
        })
    }
}

pub(crate) fn make_executor<S, E>(service: S) -> Executor<E>
where
    S: Service<Request, Response = Response, Error = E> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    E: 'static,
{
    Arc::new(move |request: Request| {
        let service = service.clone();
        let future: BoxFuture<Response, E> = Box::pin(service.oneshot(request));
        future
    })
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_status_check_passes_success_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = Client::new();
        let mut service = StatusCheck::new(make_executor(HttpTransport::new(client.clone())));
        let req = client
            .get(format!("{}/v1/ok", server.uri()))
            .build()
            .unwrap();

        let response = service.call(req).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_status_check_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/limited"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "3")
                    .set_body_json(serde_json::json!({
                        "error": "TooManyRequests",
                        "detail": "Rate limit exceeded"
                    })),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let mut service = StatusCheck::new(make_executor(HttpTransport::new(client.clone())));
        let req = client
            .get(format!("{}/v1/limited", server.uri()))
            .build()
            .unwrap();

        match service.call(req).await {
            Err(PolarError::RateLimited {
                message,
                retry_after,
            }) => {
                assert_eq!(message, "Rate limit exceeded");
                assert_eq!(retry_after, Some(std::time::Duration::from_secs(3)));
            }
            other => panic!("Expected RateLimited, got {other:?}"),
        }
    }
}
