//! # ttlcache core
//!
//! An in-process key-value cache with per-entry TTL (time-to-live).
//!
//! ## Features
//!
//! - Thread-safe storage behind a single reader/writer lock
//! - Expired entries are hidden from reads immediately (lazy check)
//! - Background sweeper that physically removes expired entries
//! - `add`/`replace` with atomic existence checks
//! - JSON snapshots that merge into a live store without clobbering fresher entries
//!
//! ## Example
//!
//! ```rust,no_run
//! use ttlcache_core::{Store, StoreConfig, Ttl};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ttlcache_core::CacheError> {
//!     let config = StoreConfig::default()
//!         .with_default_ttl(Duration::from_secs(1800))
//!         .with_sweep_interval(Duration::from_secs(3));
//!     let store = Store::with_config(config);
//!
//!     // Store a value with a 5 second TTL
//!     store.set("k1", "hello world", Duration::from_secs(5));
//!
//!     // Retrieve the value
//!     if let Some(value) = store.get("k1") {
//!         println!("Found k1: {}", value);
//!     }
//!
//!     // Only succeeds if the key is not live
//!     store.add("counter", 1, Ttl::Never)?;
//!
//!     // Persist and restore
//!     store.save_to_file("cache.json")?;
//!     let merged = store.load_file("cache.json")?;
//!     println!("merged {} entries", merged);
//!
//!     store.stop_sweeper();
//!     Ok(())
//! }
//! ```

mod config;
mod entry;
mod error;
mod snapshot;
mod store;
mod sweeper;
mod value;

pub use config::StoreConfig;
pub use entry::{now_nanos, Entry, Ttl, NO_EXPIRATION};
pub use error::{CacheError, Result};
pub use snapshot::{SNAPSHOT_FORMAT, SNAPSHOT_VERSION};
pub use store::Store;
pub use value::Value;
