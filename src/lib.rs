//! Minipaas: a container service inventory tool.
//!
//! This library discovers service images under a local container engine,
//! extracts the RDF metadata embedded in each image through an
//! ephemeral-container pipeline, and correlates the results with runtime
//! state into one unified service listing.

pub mod cache;
pub mod cli;
pub mod engine;
pub mod error;
pub mod fsutil;
pub mod inventory;
pub mod metadata;
pub mod output;
pub mod retry;
