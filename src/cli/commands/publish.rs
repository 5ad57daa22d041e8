//! Publish Command
//!
//! Flattens the old and new trees into page sets, purges pages that fell
//! out of the new set, and pushes the new pages through a second worker
//! pool behind the publisher boundary.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::progress::ProgressCounter;
use crate::config::Config;
use crate::pipeline::{self, PipelineContext};
use crate::storage;
use crate::types::{DocNode, Result, SrcWikiError};
use crate::wiki::{self, DirPublisher, Publisher, WikiPage};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;

    if !config.storage.tree_path.exists() {
        return Err(SrcWikiError::Storage(
            "no persisted tree found; run `srcwiki build` first".to_string(),
        ));
    }
    let tree = storage::load(&config.storage.tree_path)?;

    // Republishing the stored tree: old and new coincide, purge is empty.
    publish_pages(&config, &tree, &tree).await
}

pub(crate) async fn publish_pages(config: &Config, old: &DocNode, new: &DocNode) -> Result<()> {
    let publisher: Arc<dyn Publisher> = Arc::new(DirPublisher::new(&config.publishing.wiki_dir));

    let old_pages = wiki::collect_pages(old, &config.parsing.scopes)?;
    let new_pages = wiki::collect_pages(new, &config.parsing.scopes)?;

    if config.verbose {
        for page in &new_pages {
            info!(title = %page.title, "page");
        }
    }

    for page in wiki::purge_set(&old_pages, &new_pages) {
        if let Err(err) = publisher.delete_page(&page.title).await {
            warn!(title = %page.title, error = %err, "purge failed");
        }
    }

    info!("{} pages to publish", new_pages.len());
    let progress = Arc::new(ProgressCounter::new("publishing", new_pages.len()));
    let filters = Arc::new(config.publishing.filters.clone());

    let ctx = Arc::new(PipelineContext::new(new_pages, 0usize));
    {
        let publisher = Arc::clone(&publisher);
        let filters = Arc::clone(&filters);
        let progress = Arc::clone(&progress);
        pipeline::run(
            Arc::clone(&ctx),
            config.publishing.workers,
            move |page: WikiPage, ctx| {
                let publisher = Arc::clone(&publisher);
                let filters = Arc::clone(&filters);
                let progress = Arc::clone(&progress);
                async move {
                    if wiki::admits(&filters, &page.title) {
                        publisher.save_page(&page).await?;
                    }
                    ctx.with_shared(|saved| {
                        *saved += 1;
                        progress.inc();
                    })?;
                    Ok(())
                }
            },
        )
        .await?;
    }
    progress.finish();

    let processed = pipeline::into_shared(ctx)?;
    info!("processed {} pages", processed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tree::{attr, tag};
    use tempfile::TempDir;

    fn tree_with_class(name: &str) -> DocNode {
        DocNode::new(tag::COLLECTION)
            .with_attr(attr::NAME, "Docs")
            .with_child(
                DocNode::new(tag::NAMESPACE)
                    .with_attr(attr::NAME, "N")
                    .with_child(DocNode::new(tag::CLASS).with_attr(attr::NAME, name)),
            )
    }

    fn config_for(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.publishing.wiki_dir = dir.path().join("wiki");
        config
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_publish_writes_pages() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        let tree = tree_with_class("Widget");

        publish_pages(&config, &tree, &tree).await.unwrap();

        let wiki_dir = dir.path().join("wiki");
        assert!(wiki_dir.join("Docs.wiki").exists());
        assert!(wiki_dir.join("Docs.N.wiki").exists());
        assert!(wiki_dir.join("Docs.N.Widget.wiki").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_publish_purges_dropped_pages() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);

        let old = tree_with_class("Old");
        publish_pages(&config, &old, &old).await.unwrap();
        assert!(dir.path().join("wiki").join("Docs.N.Old.wiki").exists());

        let new = tree_with_class("New");
        publish_pages(&config, &old, &new).await.unwrap();
        assert!(!dir.path().join("wiki").join("Docs.N.Old.wiki").exists());
        assert!(dir.path().join("wiki").join("Docs.N.New.wiki").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_filters_limit_saved_pages() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir);
        config.publishing.filters = vec![wiki::TitleFilter::Contains("Widget".to_string())];

        let tree = tree_with_class("Widget");
        publish_pages(&config, &tree, &tree).await.unwrap();

        let wiki_dir = dir.path().join("wiki");
        assert!(wiki_dir.join("Docs.N.Widget.wiki").exists());
        assert!(!wiki_dir.join("Docs.wiki").exists());
    }
}
