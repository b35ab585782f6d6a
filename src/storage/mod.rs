//! Storage Engine Module
//!
//! This module provides the in-memory data set of DriftKV: the key space
//! (scalar map, list map, expiration index), the scalar and list
//! operations over it, and the background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │          Mutex<Keyspace>  (one lock, three maps)            │
//! │  ┌──────────────┐ ┌──────────────┐ ┌────────────────────┐   │
//! │  │   scalars    │ │    lists     │ │ expiration index   │   │
//! │  └──────────────┘ └──────────────┘ └────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │      expiry sweeper       │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Typed scalars**: integer or string, inferred on write
//! - **Integer lists**: push/pop at both ends, set semantics, segments
//! - **Lazy Expiry**: Expired keys are evicted on access
//! - **Active Expiry**: A sampling sweeper evicts keys nobody reads
//!
//! ## Example
//!
//! ```
//! use driftkv::storage::{PopMode, StorageEngine};
//!
//! let engine = StorageEngine::new();
//!
//! engine.set("session", "token123", Some(3600)).unwrap();
//! engine.rpush("jobs", &[10, 20, 30]).unwrap();
//!
//! let first = engine.lpop("jobs", PopMode::Default).unwrap();
//! assert_eq!(first, vec![10]);
//! ```

pub mod engine;
pub mod expiry;
pub mod keyspace;
pub mod list;
mod scalar;
pub mod value;

// Re-export commonly used types
pub use engine::{StorageEngine, StorageStats};
pub use keyspace::{KeyType, Keyspace};
pub use list::{End, PopMode};
pub use value::{Kind, ScalarValue};
