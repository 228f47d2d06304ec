use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::driver::BlacklistDriver;

/// Parameters accepted by the `memory` driver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryDriverParams {
    /// How often expired entries are swept out of the map.
    #[serde(with = "humantime_serde")]
    pub clear_expired_items_interval: Duration,

    /// Wait this long before the first sweep.
    #[serde(with = "humantime_serde")]
    pub clear_expired_items_interval_delay: Option<Duration>,
}

impl Default for MemoryDriverParams {
    fn default() -> Self {
        Self {
            clear_expired_items_interval: Duration::from_secs(5 * 60),
            clear_expired_items_interval_delay: None,
        }
    }
}

/// In-memory blacklist backed by a concurrent map of token → expiry.
///
/// Lookups check expiry against the clock, so an entry whose time has passed
/// is absent even before the sweeper removes it. The background sweep only
/// bounds memory.
pub struct MemoryBlacklist {
    entries: Arc<DashMap<String, i64>>,
    sweeper: Option<JoinHandle<()>>,
}

impl MemoryBlacklist {
    /// Create a blacklist without a background sweeper.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            sweeper: None,
        }
    }

    /// Create a blacklist and start its sweeper on the current tokio runtime.
    ///
    /// Without a runtime, or with a zero interval, the sweeper is not started
    /// and expired entries are only dropped by explicit [`MemoryBlacklist::sweep`] calls.
    pub fn with_sweeper(params: &MemoryDriverParams) -> Self {
        let entries = Arc::new(DashMap::new());
        let interval = params.clear_expired_items_interval;

        let sweeper = match Handle::try_current() {
            Ok(_) if interval.is_zero() => {
                tracing::warn!("Blacklist sweep interval is zero, sweeper disabled");
                None
            }
            Ok(handle) => Some(handle.spawn(sweep_loop(
                Arc::clone(&entries),
                interval,
                params.clear_expired_items_interval_delay,
            ))),
            Err(_) => {
                tracing::warn!("No tokio runtime available, blacklist sweeper disabled");
                None
            }
        };

        Self { entries, sweeper }
    }

    /// Remove every entry whose expiry has passed.
    ///
    /// # Returns
    /// Number of entries removed
    pub fn sweep(&self) -> usize {
        sweep_expired(&self.entries, Utc::now().timestamp())
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }
}

impl Default for MemoryBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryBlacklist {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

impl BlacklistDriver for MemoryBlacklist {
    fn is_exists(&self, key: &str) -> bool {
        let now = Utc::now().timestamp();
        self.entries
            .get(key)
            .is_some_and(|expires_at| *expires_at >= now)
    }

    fn set(&self, key: &str, expires_at: i64) {
        self.entries.insert(key.to_string(), expires_at);
    }
}

async fn sweep_loop(entries: Arc<DashMap<String, i64>>, interval: Duration, delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let removed = sweep_expired(&entries, Utc::now().timestamp());
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = entries.len(),
                "Swept expired blacklist entries"
            );
        }
    }
}

fn sweep_expired(entries: &DashMap<String, i64>, now: i64) -> usize {
    let before = entries.len();
    entries.retain(|_, expires_at| *expires_at >= now);
    before.saturating_sub(entries.len())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    #[test]
    fn test_set_and_exists() {
        let blacklist = MemoryBlacklist::new();

        blacklist.set("token-a", now() + 60);

        assert!(blacklist.is_exists("token-a"));
        assert!(!blacklist.is_exists("token-b"));
    }

    #[test]
    fn test_expired_entry_is_absent_before_sweep() {
        let blacklist = MemoryBlacklist::new();

        blacklist.set("old", now() - 1);

        assert!(!blacklist.is_exists("old"));
        assert_eq!(blacklist.len(), 1);
    }

    #[test]
    fn test_set_is_idempotent() {
        let blacklist = MemoryBlacklist::new();
        let expires_at = now() + 60;

        blacklist.set("token", expires_at);
        blacklist.set("token", expires_at);

        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.is_exists("token"));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let blacklist = MemoryBlacklist::new();
        blacklist.set("old-1", now() - 10);
        blacklist.set("old-2", now() - 1);
        blacklist.set("live", now() + 60);

        let removed = blacklist.sweep();

        assert_eq!(removed, 2);
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.is_exists("live"));
    }

    #[test]
    fn test_no_runtime_disables_sweeper() {
        let blacklist = MemoryBlacklist::with_sweeper(&MemoryDriverParams::default());
        assert!(!blacklist.has_sweeper());
    }

    #[tokio::test]
    async fn test_background_sweep() {
        let params = MemoryDriverParams {
            clear_expired_items_interval: Duration::from_millis(50),
            clear_expired_items_interval_delay: None,
        };
        let blacklist = MemoryBlacklist::with_sweeper(&params);
        assert!(blacklist.has_sweeper());

        blacklist.set("old", now() - 5);
        blacklist.set("live", now() + 60);

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.is_exists("live"));
    }

    #[tokio::test]
    async fn test_startup_delay_postpones_first_sweep() {
        let params = MemoryDriverParams {
            clear_expired_items_interval: Duration::from_millis(20),
            clear_expired_items_interval_delay: Some(Duration::from_secs(30)),
        };
        let blacklist = MemoryBlacklist::with_sweeper(&params);

        blacklist.set("old", now() - 5);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(blacklist.len(), 1);
    }

    #[test]
    fn test_params_from_config_shape() {
        let params: MemoryDriverParams = serde_json::from_value(json!({
            "clear_expired_items_interval": "30s",
            "clear_expired_items_interval_delay": "1m"
        }))
        .expect("Failed to parse params");

        assert_eq!(params.clear_expired_items_interval, Duration::from_secs(30));
        assert_eq!(
            params.clear_expired_items_interval_delay,
            Some(Duration::from_secs(60))
        );

        let defaults: MemoryDriverParams = serde_json::from_value(json!({
            "clear_expired_items_interval_delay": null
        }))
        .expect("Failed to parse params");
        assert_eq!(defaults.clear_expired_items_interval, Duration::from_secs(300));
        assert!(defaults.clear_expired_items_interval_delay.is_none());
    }
}
