//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Expiration sweep: removes expired TTL cache entries at a fixed interval

mod sweep;

pub use sweep::{spawn_sweep_task, Sweep};
