//! Wiki Output
//!
//! Flattening the document tree into addressable pages, diffing against the
//! previously published set, and the publishing collaborator boundary.

pub mod pages;
pub mod publisher;

pub use pages::{PageKind, TitleFilter, WikiPage, admits, collect_pages, purge_set};
pub use publisher::{DirPublisher, Publisher};
