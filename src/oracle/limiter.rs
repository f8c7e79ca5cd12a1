// src/oracle/limiter.rs
//! Token-bucket pacing for oracle calls.
//!
//! The bucket starts full; each call takes one token and tokens refill
//! continuously at `refill_per_sec` up to `capacity`.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{DynOracle, Oracle, OracleFuture, OracleRequest};

#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    pub fn new(refill_per_sec: f64, capacity: u32) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            capacity,
            refill_per_sec: refill_per_sec.max(f64::MIN_POSITIVE),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut s = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.saturating_duration_since(s.last).as_secs_f64();
                s.tokens = (s.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                s.last = now;
                if s.tokens >= 1.0 {
                    s.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - s.tokens) / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }
}

/// Oracle wrapper that takes a bucket token before every call.
pub struct RateLimited {
    inner: DynOracle,
    bucket: TokenBucket,
}

impl RateLimited {
    pub fn new(inner: DynOracle, bucket: TokenBucket) -> Self {
        Self { inner, bucket }
    }
}

impl Oracle for RateLimited {
    fn complete<'a>(&'a self, req: &'a OracleRequest) -> OracleFuture<'a> {
        Box::pin(async move {
            self.bucket.acquire().await;
            self.inner.complete(req).await
        })
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, PromptKind};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn burst_then_paced() {
        let bucket = TokenBucket::new(1.0, 2);
        let t0 = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        assert!(t0.elapsed() < Duration::from_millis(10), "burst is free");
        bucket.acquire().await;
        bucket.acquire().await;
        let el = t0.elapsed();
        assert!(el >= Duration::from_millis(1990), "elapsed {el:?}");
        assert!(el < Duration::from_millis(2100), "elapsed {el:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn wrapper_delegates_after_token() {
        let limited = RateLimited::new(Arc::new(MockOracle), TokenBucket::new(0.5, 1));
        let req = OracleRequest::new(PromptKind::Connect, "x");
        let t0 = Instant::now();
        assert!(limited.complete(&req).await.is_ok());
        assert!(limited.complete(&req).await.is_ok());
        assert!(t0.elapsed() >= Duration::from_millis(1990));
        assert_eq!(limited.provider_name(), "mock");
    }
}
