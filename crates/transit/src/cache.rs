use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use gtfs::realtime::transit_realtime::FeedMessage;
use tokio::sync::{watch, Mutex, RwLock};

/// Trip updates go stale after thirty seconds, alerts after five minutes.
pub const TRIP_UPDATES_TTL: Duration = Duration::from_secs(30);
pub const ALERTS_TTL: Duration = Duration::from_secs(300);

/// After a failed attempt the key is left alone for this long.
pub const FAILURE_WINDOW: Duration = Duration::from_secs(30);

/// How long concurrent callers wait for the one in-flight refresh before
/// degrading to stale or fallback data.
pub const REFRESH_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    TripUpdates,
    Alerts,
}

impl FeedKind {
    pub fn ttl(&self) -> Duration {
        match self {
            Self::TripUpdates => TRIP_UPDATES_TTL,
            Self::Alerts => ALERTS_TTL,
        }
    }

    pub fn key_part(&self) -> &'static str {
        match self {
            Self::TripUpdates => "tripupdates",
            Self::Alerts => "alerts",
        }
    }
}

struct Entry {
    feed: Option<Arc<FeedMessage>>,
    stored_at: Option<Instant>,
    last_attempt: Instant,
    last_success: Option<DateTime<Utc>>,
    generation: u64,
}

/// A snapshot row for the status endpoint.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub key: String,
    pub age_seconds: Option<u64>,
    pub last_success: Option<DateTime<Utc>>,
    pub generation: u64,
}

/// Outcome of joining a refresh: the leader performs the fetch, followers
/// share its result.
pub enum Refresh {
    Leader(watch::Sender<bool>),
    Follower(watch::Receiver<bool>),
}

/// Feed cache with per-key singleflight coordination. One in-flight fetch
/// per key; everyone else blocks on its completion signal.
pub struct FeedCache {
    entries: RwLock<HashMap<String, Entry>>,
    inflight: Mutex<HashMap<String, watch::Receiver<bool>>>,
    generation: AtomicU64,
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn fresh(&self, key: &str, ttl: Duration) -> Option<Arc<FeedMessage>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let stored_at = entry.stored_at?;
        if stored_at.elapsed() < ttl {
            entry.feed.clone()
        } else {
            None
        }
    }

    /// The newest stored feed regardless of age.
    pub async fn any(&self, key: &str) -> Option<Arc<FeedMessage>> {
        self.entries.read().await.get(key)?.feed.clone()
    }

    /// Whether the key failed recently enough that another attempt is not
    /// due yet.
    pub async fn in_failure_window(&self, key: &str) -> bool {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => {
                let failed_after_store = match entry.stored_at {
                    Some(stored_at) => entry.last_attempt > stored_at,
                    None => true,
                };
                failed_after_store && entry.last_attempt.elapsed() < FAILURE_WINDOW
            }
            None => false,
        }
    }

    pub async fn store(&self, key: &str, feed: Arc<FeedMessage>) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.insert(
            key.to_owned(),
            Entry {
                feed: Some(feed),
                stored_at: Some(now),
                last_attempt: now,
                last_success: Some(Utc::now()),
                generation,
            },
        );
    }

    /// Records a failed attempt. An existing feed stays put so stale reads
    /// keep working.
    pub async fn mark_failure(&self, key: &str) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries
            .entry(key.to_owned())
            .and_modify(|entry| entry.last_attempt = now)
            .or_insert(Entry {
                feed: None,
                stored_at: None,
                last_attempt: now,
                last_success: None,
                generation: 0,
            });
    }

    /// Joins the refresh for a key. The first caller becomes the leader
    /// and must call [`finish_refresh`] when done, whatever the outcome.
    pub async fn join_refresh(&self, key: &str) -> Refresh {
        let mut inflight = self.inflight.lock().await;
        if let Some(rx) = inflight.get(key) {
            return Refresh::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(false);
        inflight.insert(key.to_owned(), rx);
        Refresh::Leader(tx)
    }

    pub async fn finish_refresh(&self, key: &str, tx: watch::Sender<bool>) {
        self.inflight.lock().await.remove(key);
        let _ = tx.send(true);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn status(&self) -> Vec<EntryStatus> {
        let entries = self.entries.read().await;
        let mut rows: Vec<EntryStatus> = entries
            .iter()
            .map(|(key, entry)| EntryStatus {
                key: key.clone(),
                age_seconds: entry.stored_at.map(|at| at.elapsed().as_secs()),
                last_success: entry.last_success,
                generation: entry.generation,
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }
}
