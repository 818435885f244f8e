//! Cache domain - Store contract and request fingerprinting

mod fingerprint;
mod store;

pub use fingerprint::{canonical_json, request_fingerprint};
pub use store::{CacheEntry, CacheStore};

#[cfg(test)]
pub use store::mock::MockCacheStore;
