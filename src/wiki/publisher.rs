//! Publishing Boundary
//!
//! The wiki itself sits behind the [`Publisher`] trait: save a page, delete
//! a page. The shipped implementation writes pages into a local directory,
//! which keeps the boundary honest without a remote wiki client. Deleting a
//! page that was never published is not an error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tokio::fs;

use crate::constants::wiki::EMPTY_PAGE_TEXT;
use crate::types::{Result, SrcWikiError};
use crate::wiki::pages::WikiPage;

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn save_page(&self, page: &WikiPage) -> Result<()>;
    async fn delete_page(&self, title: &str) -> Result<()>;
}

/// Publishes pages as plain-text files under a root directory, one file per
/// page title. A page with no generated text gets the placeholder body so
/// the wiki never shows an empty page.
pub struct DirPublisher {
    root: PathBuf,
}

impl DirPublisher {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn page_path(&self, title: &str) -> PathBuf {
        // Titles never contain path separators by construction; replace
        // defensively anyway so a hostile title cannot escape the root.
        let file = title.replace(['/', '\\'], "-");
        self.root.join(format!("{file}.wiki"))
    }
}

#[async_trait]
impl Publisher for DirPublisher {
    async fn save_page(&self, page: &WikiPage) -> Result<()> {
        fs::create_dir_all(&self.root).await?;

        let text = if page.text.is_empty() {
            EMPTY_PAGE_TEXT
        } else {
            page.text.as_str()
        };
        let body = format!(
            "= {} ({}) =\n\n{}\n\nUpdated from source control: {}\n",
            page.title,
            page.kind.as_str(),
            text,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        fs::write(self.page_path(&page.title), body)
            .await
            .map_err(|e| SrcWikiError::publish(&page.title, e.to_string()))
    }

    async fn delete_page(&self, title: &str) -> Result<()> {
        match fs::remove_file(self.page_path(title)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SrcWikiError::publish(title, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::pages::PageKind;
    use tempfile::TempDir;

    fn page(title: &str, text: &str) -> WikiPage {
        WikiPage {
            title: title.to_string(),
            kind: PageKind::Class,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = TempDir::new().unwrap();
        let publisher = DirPublisher::new(dir.path());

        publisher
            .save_page(&page("Docs.Widget", "a widget"))
            .await
            .unwrap();
        let path = dir.path().join("Docs.Widget.wiki");
        assert!(path.exists());
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("a widget"));

        publisher.delete_page("Docs.Widget").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_empty_page_gets_placeholder() {
        let dir = TempDir::new().unwrap();
        let publisher = DirPublisher::new(dir.path());

        publisher.save_page(&page("Docs.Empty", "")).await.unwrap();
        let body = std::fs::read_to_string(dir.path().join("Docs.Empty.wiki")).unwrap();
        assert!(body.contains(EMPTY_PAGE_TEXT));
    }

    #[tokio::test]
    async fn test_delete_missing_page_is_ok() {
        let dir = TempDir::new().unwrap();
        let publisher = DirPublisher::new(dir.path());
        publisher.delete_page("Docs.NeverExisted").await.unwrap();
    }

    #[tokio::test]
    async fn test_title_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let publisher = DirPublisher::new(dir.path().join("pages"));

        publisher
            .save_page(&page("../escape", "nope"))
            .await
            .unwrap();
        assert!(dir.path().join("pages").join("..-escape.wiki").exists());
    }
}
