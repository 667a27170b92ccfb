//! Adapters behind the domain ports: record stores, the simulated payment
//! processor, and the static token verifier.

pub mod identity;
pub mod in_memory;
pub mod payment;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
