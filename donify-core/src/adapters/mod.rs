//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB and a PostgREST-style HTTP client for the BackendStore port
//! - JSON files and memory for the KeyValueStore port
//! - A fixed-account wallet provider and a mock certificate issuer
//! - Demo data for demo mode

pub mod demo;
pub mod duckdb;
pub mod json_file;
pub mod memory;
pub mod mock_issuer;
pub mod rest;
pub mod static_wallet;

pub use duckdb::DuckDbBackend;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use mock_issuer::MockCertificateIssuer;
pub use rest::RestBackend;
pub use static_wallet::{ApprovalPolicy, StaticWalletProvider};
