use std::time::{Duration, Instant};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;
use crate::error::Result;
use crate::scraper;

/// How long a snapshot (or a failed refresh attempt) is considered fresh.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(300);

/// Served while no fetch has ever succeeded.
pub const SNAPSHOT_UNAVAILABLE: &str = "Website data is currently unavailable.";

/// Source of the website snapshot text. Separate from the cache so tests can
/// substitute a canned fetcher.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}

/// Production fetcher: scrapes the configured website origin.
pub struct WebsiteFetcher {
    url: String,
}

impl WebsiteFetcher {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl SnapshotFetcher for WebsiteFetcher {
    async fn fetch(&self) -> Result<String> {
        scraper::fetch_page_text(&self.url).await
    }
}

#[derive(Default)]
struct Slot {
    text: Option<String>,
    last_attempt: Option<Instant>,
}

/// Single-slot TTL cache over the website snapshot.
///
/// The slot mutex is held across the refresh, so concurrent expiries perform
/// one fetch and every caller sees the result of that fetch. A failed
/// refresh keeps the previous text (stale-but-valid) and is not retried
/// until another full TTL has passed.
pub struct SnapshotCache {
    fetcher: Box<dyn SnapshotFetcher>,
    ttl: Duration,
    slot: Mutex<Slot>,
}

impl SnapshotCache {
    pub fn new(fetcher: Box<dyn SnapshotFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub async fn get(&self) -> String {
        let mut slot = self.slot.lock().await;

        let refresh_due = slot
            .last_attempt
            .map_or(true, |at| at.elapsed() >= self.ttl);
        if refresh_due {
            // Recorded before the fetch so a failure is not hot-looped.
            slot.last_attempt = Some(Instant::now());
            match self.fetcher.fetch().await {
                Ok(text) => slot.text = Some(text),
                Err(err) => warn!("Website snapshot refresh failed: {err}"),
            }
        }

        slot.text
            .clone()
            .unwrap_or_else(|| SNAPSHOT_UNAVAILABLE.to_string())
    }
}
