//! Client-side request throttle.
//!
//! A token bucket holding up to `requests_per_minute` tokens, refilled
//! continuously at `requests_per_minute / 60` tokens per second. Every request
//! takes one token; when the bucket is empty the request waits until a token
//! becomes available. The bucket lives behind a [`tokio::sync::Mutex`] and is
//! shared by every clone of the client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tower::{Layer, Service, ServiceExt};

struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(requests_per_minute: u32) -> Self {
        let capacity = f64::from(requests_per_minute.max(1));
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Takes a token, or returns how long until one is available.
    fn try_take(&mut self) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_per_sec))
        }
    }
}

/// Thread-safe requests-per-minute limiter.
pub struct RateLimiter {
    requests_per_minute: u32,
    bucket: Mutex<TokenBucket>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("requests_per_minute", &self.requests_per_minute)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// `requests_per_minute` is clamped to at least 1.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute: requests_per_minute.max(1),
            bucket: Mutex::new(TokenBucket::new(requests_per_minute)),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Wait until a request may start.
    ///
    /// The lock is released while sleeping, so concurrent callers queue on
    /// the bucket rather than on each other's sleeps.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.bucket.lock().await.try_take() {
                Ok(()) => return,
                Err(wait) => wait,
            };
            debug!("[Polar] rate limit reached, waiting {:?}", wait);
            sleep(wait).await;
        }
    }

    /// Take a token without waiting. Returns `false` if the bucket is empty.
    pub async fn try_acquire(&self) -> bool {
        self.bucket.lock().await.try_take().is_ok()
    }
}

/// Layer applying a shared [`RateLimiter`] before each request.
///
/// A layer built with [`RateLimitMiddleware::unlimited`] passes requests
/// straight through.
#[derive(Debug, Clone, Default)]
pub struct RateLimitMiddleware {
    limiter: Option<Arc<RateLimiter>>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter: Some(limiter),
        }
    }

    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(Arc::new(RateLimiter::new(requests_per_minute)))
    }

    pub fn unlimited() -> Self {
        Self { limiter: None }
    }

    pub fn limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.limiter.as_ref()
    }
}

impl<S> Layer<S> for RateLimitMiddleware {
    type Service = RateLimitMiddlewareService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddlewareService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitMiddlewareService<S> {
    inner: S,
    limiter: Option<Arc<RateLimiter>>,
}

impl<S, R> Service<R> for RateLimitMiddlewareService<S>
where
    S: Service<R> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send,
    S::Error: Send,
    R: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let inner = self.inner.clone();
        let limiter = self.limiter.clone();

        Box::pin(async move {
            if let Some(limiter) = limiter {
                limiter.acquire().await;
            }
            inner.oneshot(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_up_to_capacity_is_immediate() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(!limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_refill_when_empty() {
        let limiter = RateLimiter::new(60);
        for _ in 0..60 {
            limiter.acquire().await;
        }

        let start = Instant::now();
        limiter.acquire().await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_millis(990), "waited {waited:?}");
        assert!(waited <= Duration::from_millis(1100), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquire_is_serialized_by_bucket() {
        let limiter = Arc::new(RateLimiter::new(120));
        for _ in 0..120 {
            limiter.acquire().await;
        }

        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // 4 tokens at 2 tokens/sec
        assert!(start.elapsed() >= Duration::from_millis(1900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_layer_shares_one_bucket() {
        use std::sync::atomic::{AtomicU32, Ordering};

        #[derive(Clone)]
        struct Counting(Arc<AtomicU32>);

        impl Service<()> for Counting {
            type Response = ();
            type Error = ();
            type Future = Pin<Box<dyn Future<Output = Result<(), ()>> + Send>>;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), ()>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, _req: ()) -> Self::Future {
                self.0.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(()) })
            }
        }

        let calls = Arc::new(AtomicU32::new(0));
        let layer = RateLimitMiddleware::per_minute(2);
        let mut first = layer.layer(Counting(Arc::clone(&calls)));
        let mut second = layer.layer(Counting(Arc::clone(&calls)));

        let start = Instant::now();
        first.call(()).await.unwrap();
        second.call(()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        first.call(()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(29));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unlimited_layer_has_no_limiter() {
        assert!(RateLimitMiddleware::unlimited().limiter().is_none());
        assert!(RateLimitMiddleware::per_minute(10).limiter().is_some());
    }

    #[test]
    fn test_zero_is_clamped() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.requests_per_minute(), 1);
    }
}
