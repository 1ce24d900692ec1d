// Login failure throttling per source address
// Decision: Sliding window of attempt timestamps, kept in memory (single instance)
// Decision: A slot is reserved before credentials are checked, so concurrent attempts
//           cannot overrun the cap; a successful login clears the source's record

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use super::config::LoginLimitConfig;

/// Stale sources are swept only once the table tracks this many
const SWEEP_THRESHOLD: usize = 10_000;

/// Source address of a request, used as the rate-limit key.
/// Prefers the socket peer address, then the first `X-Forwarded-For` hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub const UNKNOWN: &'static str = "unknown";
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientIp(addr.ip().to_string()));
        }

        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        Ok(ClientIp(
            forwarded.unwrap_or(ClientIp::UNKNOWN).to_string(),
        ))
    }
}

/// Per-source login attempt limiter
pub struct LoginRateLimiter {
    table: RwLock<AttemptTable>,
    config: LoginLimitConfig,
}

#[derive(Default)]
struct AttemptTable {
    sources: HashMap<String, VecDeque<Instant>>,
    /// Reservations since the last sweep of stale sources
    since_sweep: usize,
}

impl AttemptTable {
    /// Drop sources whose newest attempt has left the window.
    /// Runs once the table is large and at least as many reservations as
    /// tracked sources happened since the previous sweep, so the cost per
    /// reservation stays constant.
    fn maybe_sweep(&mut self, now: Instant, window: Duration) {
        if self.sources.len() < SWEEP_THRESHOLD || self.since_sweep < self.sources.len() {
            return;
        }
        self.sources.retain(|_, attempts| {
            attempts
                .back()
                .is_some_and(|t| now.saturating_duration_since(*t) < window)
        });
        self.since_sweep = 0;
    }
}

impl LoginRateLimiter {
    pub fn new(config: LoginLimitConfig) -> Self {
        Self {
            table: RwLock::new(AttemptTable::default()),
            config,
        }
    }

    /// Reserve an attempt slot for `source` before credentials are checked.
    /// The slot counts as a failure unless `reset` is called after a
    /// successful login. Returns the time until the oldest attempt leaves the
    /// window when the source is blocked.
    pub fn try_acquire(&self, source: &str) -> Result<(), Duration> {
        self.try_acquire_at(source, Instant::now())
    }

    /// Forget all attempts for `source`
    pub fn reset(&self, source: &str) {
        self.table.write().sources.remove(source);
    }

    fn try_acquire_at(&self, source: &str, now: Instant) -> Result<(), Duration> {
        let window = self.config.window;
        let mut table = self.table.write();
        table.maybe_sweep(now, window);

        let attempts = table.sources.entry(source.to_string()).or_default();
        while attempts
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= window)
        {
            attempts.pop_front();
        }

        if attempts.len() >= self.config.max_attempts {
            let oldest = attempts.front().copied().unwrap_or(now);
            return Err(window.saturating_sub(now.saturating_duration_since(oldest)));
        }

        attempts.push_back(now);
        table.since_sweep += 1;
        Ok(())
    }

    #[cfg(test)]
    fn tracked_sources(&self) -> usize {
        self.table.read().sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::sync::Arc;

    fn limiter(max_attempts: usize, window_secs: u64) -> LoginRateLimiter {
        LoginRateLimiter::new(LoginLimitConfig {
            max_attempts,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn test_blocks_after_max_attempts() {
        let limiter = limiter(5, 900);
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.try_acquire_at("10.0.0.1", start).is_ok(), "attempt {}", i + 1);
        }

        let retry_after = limiter.try_acquire_at("10.0.0.1", start).unwrap_err();
        assert_eq!(retry_after, Duration::from_secs(900));
    }

    #[test]
    fn test_blocked_attempts_do_not_extend_the_block() {
        let limiter = limiter(2, 60);
        let start = Instant::now();
        limiter.try_acquire_at("10.0.0.1", start).unwrap();
        limiter.try_acquire_at("10.0.0.1", start).unwrap();

        for secs in [10, 20, 30] {
            assert!(limiter
                .try_acquire_at("10.0.0.1", start + Duration::from_secs(secs))
                .is_err());
        }
        assert!(limiter
            .try_acquire_at("10.0.0.1", start + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn test_sources_are_independent() {
        let limiter = limiter(2, 900);
        let now = Instant::now();
        limiter.try_acquire_at("10.0.0.1", now).unwrap();
        limiter.try_acquire_at("10.0.0.1", now).unwrap();

        assert!(limiter.try_acquire_at("10.0.0.1", now).is_err());
        assert!(limiter.try_acquire_at("10.0.0.2", now).is_ok());
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, 60);
        let start = Instant::now();
        limiter.try_acquire_at("10.0.0.1", start).unwrap();
        limiter
            .try_acquire_at("10.0.0.1", start + Duration::from_secs(30))
            .unwrap();

        let retry_after = limiter
            .try_acquire_at("10.0.0.1", start + Duration::from_secs(40))
            .unwrap_err();
        assert_eq!(retry_after, Duration::from_secs(20));

        // First attempt has aged out
        assert!(limiter
            .try_acquire_at("10.0.0.1", start + Duration::from_secs(61))
            .is_ok());
    }

    #[test]
    fn test_reset_clears_attempts() {
        let limiter = limiter(1, 900);
        limiter.try_acquire("10.0.0.1").unwrap();
        assert!(limiter.try_acquire("10.0.0.1").is_err());

        limiter.reset("10.0.0.1");
        assert!(limiter.try_acquire("10.0.0.1").is_ok());
    }

    #[test]
    fn test_concurrent_reservations_respect_the_cap() {
        let limiter = Arc::new(limiter(5, 900));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.try_acquire("10.0.0.1").is_ok())
            })
            .collect();

        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(granted, 5);
    }

    #[test]
    fn test_stale_sources_are_swept() {
        let limiter = limiter(5, 60);
        let start = Instant::now();
        for i in 0..SWEEP_THRESHOLD {
            limiter
                .try_acquire_at(&format!("10.1.{}.{}", i / 256, i % 256), start)
                .unwrap();
        }
        assert_eq!(limiter.tracked_sources(), SWEEP_THRESHOLD);

        // Everything above has aged out; the next reservation triggers a sweep
        limiter
            .try_acquire_at("10.2.0.1", start + Duration::from_secs(61))
            .unwrap();
        assert_eq!(limiter.tracked_sources(), 1);
    }

    #[tokio::test]
    async fn test_client_ip_from_forwarded_header() {
        let (mut parts, _) = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap()
            .into_parts();

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, ClientIp("203.0.113.7".to_string()));
    }

    #[tokio::test]
    async fn test_client_ip_prefers_socket_address() {
        let (mut parts, _) = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0, "192.0.2.1");
    }

    #[tokio::test]
    async fn test_client_ip_unknown() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0, ClientIp::UNKNOWN);
    }
}
