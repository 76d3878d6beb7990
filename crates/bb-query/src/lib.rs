//! # bb-query
//!
//! The client-side data layer: the query cache, the reads that fill it and
//! the optimistic mutations that rewrite it ahead of the server.

pub mod cache;
pub mod mutations;
pub mod patch;
pub mod queries;
pub mod session;

pub use cache::{CacheEntry, CacheEvent, CacheEventKind, Observer, QueryCache, QueryData, QueryKey, QueryName};
pub use mutations::{MutationHandle, ReadOptions, ThreadMutations, ThreadTarget};
pub use queries::{MountedThread, PageFetch, QueryClient, SkipReason};
pub use session::{CurrentUser, Session};
