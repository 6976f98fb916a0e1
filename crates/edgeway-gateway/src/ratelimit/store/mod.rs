//! Bucket store implementations.

mod memory;
mod redis;

pub use memory::MemoryBucketStore;
pub use redis::RedisBucketStore;
