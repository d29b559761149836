//! Umbrella crate for Cityscope.
//!
//! This crate is intentionally small: it re-exports the engine and protocol crates
//! so downstream code can depend on a single crate name (`cityscope`).

pub use cityscope_engine as engine;
pub use cityscope_protocol as protocol;
