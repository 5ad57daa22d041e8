//! Source Analysis
//!
//! Everything between raw checkout and document tree: workspace walking,
//! structural pattern extraction, and doc-comment interpretation.

pub mod doc_comment;
pub mod scanner;
pub mod structure;

pub use scanner::{ScannedSource, WorkspaceScanner};
pub use structure::StructureParser;
