//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// Wiki page constants
pub mod wiki {
    /// Maximum length of a wiki page title
    pub const TITLE_MAX_LEN: usize = 255;

    /// Body written for pages whose node produced no text
    pub const EMPTY_PAGE_TEXT: &str = "No documentation generated from source control.";

    /// Type stand-in for parameters with no recorded type
    pub const UNKNOWN_PARAM_TYPE: &str = "unknown";
}

/// Worker-pool defaults
pub mod pipeline {
    /// Default workers for the parse stage
    pub const DEFAULT_PARSE_WORKERS: usize = 4;

    /// Default workers for the publish stage
    pub const DEFAULT_PUBLISH_WORKERS: usize = 4;
}
