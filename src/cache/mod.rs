//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! Cacheable GET:
//!     → key.rs (method + path + sorted params + body → key)
//!     → ttl.rs (hit: return clone; stale: evict on read; miss: fall through)
//!     → On success: ttl.rs stores the decoded value with its TTL
//!
//! Background:
//!     sweeper.rs → ttl.rs sweep() on a fixed interval
//! ```
//!
//! # Design Decisions
//! - Expiry is checked on every read, so the sweeper only bounds memory
//! - Entries are cloned out; callers never hold a lock across an await

pub mod key;
pub mod sweeper;
pub mod ttl;

pub use key::cache_key;
pub use sweeper::{CacheSweeper, SweeperHandle};
pub use ttl::{CacheStats, TtlCache};
