//! Gateway Module
//!
//! The single mandatory choke point for all document-database calls,
//! composing call logging, rate-limiting/de-duplication, and an optional
//! short-lived result cache.

mod firestore;
mod options;

pub use firestore::{CallContext, FirestoreGateway, FirestoreOp};
pub use options::ExecuteOptions;
