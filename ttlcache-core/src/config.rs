use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a [`Store`](crate::Store)
///
/// # Example
///
/// ```rust
/// use ttlcache_core::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_default_ttl(Duration::from_secs(1800))
///     .with_sweep_interval(Duration::from_secs(3));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// TTL used for `Ttl::Default` writes (`None` = never expire)
    pub default_ttl: Option<Duration>,
    /// Interval between background sweeps (`None` = no sweeper, default: 60 seconds)
    pub sweep_interval: Option<Duration>,
    /// Snapshot file rewritten after every successful write (default: off)
    pub autosave_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: None,
            sweep_interval: Some(Duration::from_secs(60)),
            autosave_path: None,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL applied when a write asks for `Ttl::Default`.
    ///
    /// A zero duration means "never expire".
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = if ttl.is_zero() { None } else { Some(ttl) };
        self
    }

    /// Sets the sweep interval
    ///
    /// This determines how often the background task runs to remove expired entries.
    ///
    /// # Arguments
    ///
    /// * `interval` - The duration between sweeps. Zero disables the sweeper.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = if interval.is_zero() { None } else { Some(interval) };
        self
    }

    /// Disables the background sweeper; expired entries are then only
    /// removed by explicit `delete_expired` calls.
    pub fn without_sweeper(mut self) -> Self {
        self.sweep_interval = None;
        self
    }

    /// Rewrites the snapshot at `path` after every `set`, `add` and `replace`.
    ///
    /// Every write then pays for a full snapshot. Prefer calling
    /// `save_to_file` explicitly.
    pub fn with_autosave(mut self, path: impl Into<PathBuf>) -> Self {
        self.autosave_path = Some(path.into());
        self
    }
}
