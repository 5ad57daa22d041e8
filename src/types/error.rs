//! Unified Error Type System
//!
//! Single error type for the whole application. The parser itself is
//! best-effort and never errors on unrecognized source; errors here cover
//! the boundaries around it: configuration, persistence, publishing, and
//! pipeline faults.
//!
//! Recognition misses and malformed doc comments are *not* errors — they are
//! expressed as `Option` returns at the call site and the declaration keeps
//! its signature-derived nodes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SrcWikiError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Publish failed for {page}: {reason}")]
    Publish { page: String, reason: String },

    /// A node kind with no page mapping reached the publish boundary.
    /// This is a contract violation, not a recoverable input condition.
    #[error("Unknown page kind: {0}")]
    UnknownPageKind(String),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    /// Worker-pool fault: poisoned lock, panicked worker, failed join.
    /// Not expected under correct use; always fatal.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl SrcWikiError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn publish(page: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Publish {
            page: page.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SrcWikiError>;
