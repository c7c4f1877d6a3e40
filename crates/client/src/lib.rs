//! Blocking HTTP row-data source.
//!
//! Maps the `RowSource` contract onto the backend's endpoints. Blocking
//! reqwest client (no Tokio runtime required); the engine drives one
//! request at a time, so there is nothing to gain from an async stack.

pub mod client;

pub use client::HttpRowSource;
