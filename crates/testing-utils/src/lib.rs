//! # Migrator Testing Utils
//!
//! Shared testing utilities for the repository migrator workspace.
//! This crate provides test doubles for the transfer port and the migration
//! executor, plus builders for migration tasks.
//!
//! ## Features
//!
//! - **FakeTransport**: scripted `MirrorTransport` that never touches git or the network
//! - **ScriptedExecutor**: `MigrationExecutor` with per-task outcome sequences and
//!   concurrency tracking
//! - **Test Data Builders**: utilities for creating migration tasks
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! migrator-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use mocks::*;
