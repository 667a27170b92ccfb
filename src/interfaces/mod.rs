//! Adapters that feed external data into the application layer.

pub mod seed;
