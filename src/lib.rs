//! docsweep: remove an ingested document and everything derived from it
//! from a LightRAG knowledge store, in one transaction.

pub mod commands;
pub mod config;
pub mod error;
pub mod plan;
pub mod store;
