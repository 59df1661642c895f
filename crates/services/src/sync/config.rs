use std::env;
use std::time::Duration;

/// Queue length that triggers an immediate flush.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Delay before a deferred flush (and between retries).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub batch_size: usize,
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `QUIZ_SYNC_BATCH_SIZE` and `QUIZ_SYNC_INTERVAL_SECS`.
    ///
    /// Unparseable or zero values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let batch_size = env::var("QUIZ_SYNC_BATCH_SIZE")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(defaults.batch_size);
        let interval = env::var("QUIZ_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&v| v > 0)
            .map_or(defaults.interval, Duration::from_secs);
        Self {
            batch_size,
            interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_batching_policy() {
        let config = SyncConfig::default();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.interval, Duration::from_secs(60));
    }
}
