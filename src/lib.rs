//! srcwiki - Incremental Wiki Documentation Extractor
//!
//! Extracts a structural documentation model from a checkout of C# source
//! files and accumulates it, run after run, into a single document tree that
//! is flattened into addressable wiki pages.
//!
//! ## Core Features
//!
//! - **Heuristic Structural Parser**: layered patterns and brace-depth
//!   scanning, deliberately not a compiler front end
//! - **Doc-Comment Interpreter**: `///` XML comments become structured nodes
//! - **Equivalence Merge**: idempotent node-by-node tree merging makes the
//!   accumulation order-independent and incremental
//! - **Worker-Pool Pipeline**: bounded concurrency with an exactly-once
//!   completion barrier, reused for parsing and publishing
//! - **Publish Diff**: flattened old/new page sets yield the purge set
//!
//! ## Modules
//!
//! - [`analyzer`]: workspace scanning, structural parsing, doc comments
//! - [`merge`]: the equivalence-based tree merge engine
//! - [`pipeline`]: the generic worker pool
//! - [`storage`]: XML persistence of the cumulative tree
//! - [`wiki`]: page flattening, diffing, and the publisher boundary
//! - [`config`]: layered configuration

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod merge;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod wiki;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{Result, SrcWikiError};

// Document Tree
pub use types::tree::DocNode;
