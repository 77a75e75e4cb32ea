//! Persistent Store Module
//!
//! Durable, partitioned key-value storage backing every cache layer.

mod entity_store;

pub use entity_store::{EntityStore, Partition};
