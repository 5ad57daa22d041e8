//! Build Command
//!
//! Scans the workspace, parses every selected file through the worker pool,
//! merges the per-file trees into the cumulative tree, and persists it. The
//! previously persisted tree is kept aside as the old side of the publish
//! diff when `--publish` is set.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::analyzer::{ScannedSource, StructureParser, WorkspaceScanner};
use crate::cli::progress::ProgressCounter;
use crate::merge::merge_into;
use crate::pipeline::{self, PipelineContext};
use crate::storage;
use crate::types::tree::{attr, tag};
use crate::types::{DocNode, Result, SrcWikiError};

/// Shared accumulator for the parse stage: the tree the workers merge into,
/// and the outcome of the completion-time save so the command can propagate
/// a persistence failure instead of reporting success over a missing file.
struct BuildState {
    tree: DocNode,
    save_result: Option<Result<()>>,
}

pub async fn run(config_path: Option<&Path>, full: bool, publish: bool) -> Result<()> {
    let config = super::load_config(config_path)?;

    let scanner = WorkspaceScanner::new(&config.workspace.root)
        .with_exclude(config.workspace.exclude.clone());
    let files = scanner.scan()?;
    info!("found {} source files", files.len());

    let old_tree = storage::load_or_default(&config.storage.tree_path, &config.collection)?;
    let start_tree = if full {
        DocNode::new(tag::COLLECTION).with_attr(attr::NAME, &config.collection)
    } else {
        old_tree.clone()
    };

    let parser = Arc::new(StructureParser::new(
        &config.collection,
        &config.parsing.scopes,
    ));
    let progress = Arc::new(ProgressCounter::new("parsing", files.len()));

    let tree_path = config.storage.tree_path.clone();
    let state = BuildState {
        tree: start_tree,
        save_result: None,
    };
    let ctx = Arc::new(PipelineContext::new(files, state).with_on_complete(
        move |state: &mut BuildState| {
            // The last worker persists the tree; the outcome travels back to
            // the command through the shared state.
            state.save_result = Some(storage::save(&state.tree, &tree_path));
        },
    ));

    {
        let parser = Arc::clone(&parser);
        let progress = Arc::clone(&progress);
        pipeline::run(
            Arc::clone(&ctx),
            config.parsing.workers,
            move |file: ScannedSource, ctx| {
                let parser = Arc::clone(&parser);
                let progress = Arc::clone(&progress);
                async move {
                    let contents = tokio::fs::read_to_string(&file.path).await?;
                    let parsed = parser.parse(&contents, &file.ancestry);
                    ctx.with_shared(|state| {
                        merge_into(&mut state.tree, &parsed);
                        progress.inc();
                    })?;
                    Ok(())
                }
            },
        )
        .await?;
    }
    progress.finish();

    let state = pipeline::into_shared(ctx)?;
    match state.save_result {
        Some(Ok(())) => info!("tree persisted to {}", config.storage.tree_path.display()),
        Some(Err(err)) => return Err(err),
        None => {
            return Err(SrcWikiError::Pipeline(
                "completion callback never ran".to_string(),
            ));
        }
    }

    if publish {
        super::publish::publish_pages(&config, &old_tree, &state.tree).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, tree_path: &Path) -> std::path::PathBuf {
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "collection = \"Docs\"\n\n[workspace]\nroot = \"{}\"\n\n[storage]\ntree_path = \"{}\"\n",
                dir.path().display(),
                tree_path.display()
            ),
        )
        .unwrap();
        config_path
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_build_persists_tree() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("One.cs"),
            "namespace N {\n    public class C {\n    }\n}\n",
        )
        .unwrap();
        let tree_path = dir.path().join("state").join("tree.xml");
        let config_path = write_config(&dir, &tree_path);

        run(Some(&config_path), false, false).await.unwrap();

        let tree = storage::load(&tree_path).unwrap();
        assert_eq!(tree.descendants(tag::CLASS).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_build_fails_when_tree_cannot_be_saved() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("One.cs"),
            "namespace N {\n    public class C {\n    }\n}\n",
        )
        .unwrap();

        // A plain file where the tree's parent directory should be makes
        // the save fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let config_path = write_config(&dir, &blocker.join("tree.xml"));

        let err = run(Some(&config_path), false, false).await.unwrap_err();
        assert!(matches!(err, SrcWikiError::Io(_)));
    }
}
