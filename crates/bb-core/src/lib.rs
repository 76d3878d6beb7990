//! boba-client/crates/bb-core/src/lib.rs
//!
//! Client-side entities, server record types, the record mapper and the
//! ports every adapter implements.

pub mod error;
pub mod mapper;
pub mod models;
pub mod records;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
