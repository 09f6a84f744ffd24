//! Seatwise application layer: the data-service client, fetch orchestration,
//! per-cluster assembly sessions and CLI configuration.

pub mod client;
pub mod config;
pub mod context;
pub mod observability;
pub mod orchestrator;
pub mod records;
pub mod service;
