use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Buckets beyond this count trigger a sweep of idle clients.
const SWEEP_THRESHOLD: usize = 10_000;

/// Per-client token bucket: `max` requests per `window`, refilled smoothly.
#[derive(Clone)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    clients: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// `Err` carries how long the client should wait before retrying.
    pub async fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), Duration> {
        let capacity = self.max as f64;
        let per_sec = capacity / self.window.as_secs_f64();

        let mut clients = self.clients.lock().await;
        if clients.len() >= SWEEP_THRESHOLD {
            clients.retain(|_, b| now.saturating_duration_since(b.last) < self.window);
        }

        let bucket = clients.entry(client).or_insert(Bucket {
            tokens: capacity,
            last: now,
        });
        let elapsed = now.saturating_duration_since(bucket.last);
        bucket.last = now;
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * per_sec).min(capacity);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(());
        }
        Err(Duration::from_secs_f64((1.0 - bucket.tokens) / per_sec))
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}
