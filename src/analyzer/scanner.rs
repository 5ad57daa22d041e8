//! Workspace Scanner
//!
//! Walks a source-control checkout and selects the C# files to analyze,
//! decomposing each path into the folder ancestry the structural parser
//! needs. Generated designer files are skipped; they carry no hand-written
//! documentation.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::types::Result;

/// Generated-file suffix excluded from analysis (case-insensitive).
const DESIGNER_SUFFIX: &str = ".designer.cs";

const SOURCE_EXTENSION: &str = "cs";

/// A selected source file together with its folder ancestry relative to the
/// workspace root. The ancestry excludes the filename; its first segment is
/// the team-project folder.
#[derive(Debug, Clone)]
pub struct ScannedSource {
    pub path: PathBuf,
    pub ancestry: Vec<String>,
}

pub struct WorkspaceScanner {
    root: PathBuf,
    exclude: Vec<String>,
}

impl WorkspaceScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            exclude: vec![],
        }
    }

    /// Additional glob patterns to exclude, matched against the full path.
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    pub fn scan(&self) -> Result<Vec<ScannedSource>> {
        let mut files = Vec::new();

        for entry in self.walker().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !self.selects(path) {
                continue;
            }
            files.push(ScannedSource {
                path: path.to_path_buf(),
                ancestry: self.ancestry(path),
            });
        }

        Ok(files)
    }

    fn walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .build()
    }

    fn selects(&self, path: &Path) -> bool {
        path.is_file()
            && self.check_extension(path)
            && !self.is_designer_file(path)
            && !self.should_exclude(path)
    }

    fn check_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
            .unwrap_or(false)
    }

    fn is_designer_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| name.to_lowercase().ends_with(DESIGNER_SUFFIX))
            .unwrap_or(false)
    }

    fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.exclude {
            if glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
            {
                return true;
            }
        }

        false
    }

    /// Folder segments between the workspace root and the file, in order.
    fn ancestry(&self, path: &Path) -> Vec<String> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let mut segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        segments.pop(); // drop the filename
        segments
    }
}
