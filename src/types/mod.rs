pub mod error;
pub mod tree;

pub use error::{Result, SrcWikiError};
pub use tree::{DocNode, attr, tag};
