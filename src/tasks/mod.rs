//! Background Tasks Module
//!
//! Contains background tasks spawned during operation.
//!
//! # Tasks
//! - Catalog preload: one-shot, best-effort population of full records
//! - Expiry sweep: periodically drops expired rate-limiter and
//!   gateway-cache entries

mod preload;
mod sweep;

pub use preload::spawn_preload_task;
pub use sweep::spawn_sweep_task;
