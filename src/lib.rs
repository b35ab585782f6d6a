//! # DriftKV - An Embedded Key-Value Store with Expiration and Snapshots
//!
//! DriftKV is an in-process key-value store. Keys map either to a typed
//! scalar (integer or string) or to an ordered list of integers. Any key
//! can carry a time-to-live, and the whole key space is periodically
//! snapshotted to durable storage and restored on startup.
//!
//! ## Features
//!
//! - **Typed scalars**: integer-looking text is stored as an integer
//! - **Integer lists**: push, pop by count or range, segment delete, set-like append
//! - **TTL Support**: lazy expiry on access plus a sampling background sweep
//! - **Snapshots**: JSON document to a flat file or to versioned SQLite rows
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                Store                                    │
//! │                                                                         │
//! │  caller ops ───────────────┐                                            │
//! │                            ▼                                            │
//! │                     ┌──────────────────────────────────────────────┐    │
//! │                     │              StorageEngine                   │    │
//! │                     │   Mutex<Keyspace>                            │    │
//! │                     │  ┌─────────┐ ┌─────────┐ ┌──────────────┐    │    │
//! │                     │  │ scalars │ │  lists  │ │ expirations  │    │    │
//! │                     │  └─────────┘ └─────────┘ └──────────────┘    │    │
//! │                     └──────────────────────────────────────────────┘    │
//! │                          ▲                          │                   │
//! │                          │ sweep                    │ encode            │
//! │              ┌───────────┴─────────┐     ┌──────────▼──────────┐        │
//! │              │    Expiry sweeper   │     │     Snapshotter     │        │
//! │              │ (Background task)   │     │  (Background task)  │        │
//! │              └─────────────────────┘     └──────────┬──────────┘        │
//! │                                                     ▼                   │
//! │                                          ┌─────────────────────┐        │
//! │                                          │  FileSink | Sqlite  │        │
//! │                                          └─────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use driftkv::{PopMode, Store, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> driftkv::Result<()> {
//!     let store = Store::open(StoreConfig::builder().file("data/store.json").build()).await?;
//!     let engine = store.engine();
//!
//!     engine.set("visits", "41", None)?;
//!     engine.rpush("queue", &[1, 2, 3, 4])?;
//!     engine.expire("queue", 30)?;
//!     let head = engine.lpop("queue", PopMode::Count(2))?;
//!     assert_eq!(head, vec![1, 2]);
//!
//!     store.stop().await
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: key space, typed values, list operations, expiry
//! - [`persistence`]: snapshot sinks and the periodic snapshot task
//! - [`lifecycle`]: the [`Store`] that starts and stops everything
//! - [`config`]: intervals and backend selection
//! - [`error`]: error kinds returned by every operation
//!
//! ## Design Highlights
//!
//! ### One Lock, Three Maps
//!
//! Scalars, lists and the expiration index live behind a single mutex so
//! that every operation, sweep and snapshot sees them consistently.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: an expired key is evicted when it is next accessed
//! 2. **Active**: a background task samples keys with a TTL and evicts expired ones
//!
//! ### Snapshots Off The Lock
//!
//! The key space is encoded while holding the lock; the write to the sink
//! happens on Tokio's blocking pool after the lock is released.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod persistence;
pub mod storage;
pub mod time;

// Re-export commonly used types for convenience
pub use config::StoreConfig;
pub use error::{Result, SinkError, StoreError};
pub use lifecycle::{LifecycleState, Store};
pub use persistence::{FileSink, SinkConfig, SnapshotSink, SqliteSink};
pub use storage::{End, KeyType, Kind, PopMode, StorageEngine, StorageStats};

/// Version of DriftKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
