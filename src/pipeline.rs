//! Concurrent Work Pipeline
//!
//! A fixed worker pool draining a shared queue, with an exactly-once
//! completion callback that runs in whichever worker deregisters last.
//! The same machinery drives both phases: parsing source files into the
//! cumulative tree, and publishing flattened pages.
//!
//! All coordination state lives in [`PipelineContext`]; nothing is global.
//! Locks are standard mutexes and are never held across an await point:
//! workers pop an item, run the handler, and only then take the shared
//! lock to fold results in.
//!
//! The completion barrier is a count-to-zero registry. Every worker id is
//! registered *before* any worker task is spawned, so a fast worker that
//! drains an empty queue immediately cannot observe a registry that other
//! workers have not joined yet. The last deregistering worker checks that
//! the queue is drained and takes the callback under the registry lock,
//! guaranteeing exactly one invocation even when the queue starts empty.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::types::{Result, SrcWikiError};

type CompletionFn<S> = Box<dyn FnOnce(&mut S) + Send>;

struct Registry {
    running: HashSet<usize>,
    fired: bool,
}

/// Shared state for one pipeline run: the work queue, the accumulator the
/// workers fold into, and the completion registry.
pub struct PipelineContext<T, S> {
    queue: Mutex<VecDeque<T>>,
    shared: Mutex<S>,
    registry: Mutex<Registry>,
    on_complete: Mutex<Option<CompletionFn<S>>>,
}

fn poisoned(what: &str) -> SrcWikiError {
    SrcWikiError::Pipeline(format!("{what} lock poisoned"))
}

impl<T, S> PipelineContext<T, S> {
    pub fn new(items: Vec<T>, shared: S) -> Self {
        Self {
            queue: Mutex::new(items.into()),
            shared: Mutex::new(shared),
            registry: Mutex::new(Registry {
                running: HashSet::new(),
                fired: false,
            }),
            on_complete: Mutex::new(None),
        }
    }

    /// Callback invoked exactly once, with the shared state, after the last
    /// worker drains the queue.
    pub fn with_on_complete(self, f: impl FnOnce(&mut S) + Send + 'static) -> Self {
        if let Ok(mut slot) = self.on_complete.lock() {
            *slot = Some(Box::new(f));
        }
        self
    }

    /// Pop the next work item, or `None` when the queue is drained.
    pub fn next_item(&self) -> Result<Option<T>> {
        Ok(self
            .queue
            .lock()
            .map_err(|_| poisoned("queue"))?
            .pop_front())
    }

    /// Run `f` with exclusive access to the shared accumulator.
    pub fn with_shared<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R> {
        let mut shared = self.shared.lock().map_err(|_| poisoned("shared"))?;
        Ok(f(&mut shared))
    }

    fn register_all(&self, workers: usize) -> Result<()> {
        let mut registry = self.registry.lock().map_err(|_| poisoned("registry"))?;
        registry.running.extend(0..workers);
        Ok(())
    }

    /// Remove `id` from the running set. Returns the completion callback
    /// when this was the last worker and the queue is drained.
    fn deregister(&self, id: usize) -> Result<Option<CompletionFn<S>>> {
        let mut registry = self.registry.lock().map_err(|_| poisoned("registry"))?;
        registry.running.remove(&id);
        if registry.running.is_empty() && !registry.fired {
            let drained = self
                .queue
                .lock()
                .map_err(|_| poisoned("queue"))?
                .is_empty();
            if drained {
                registry.fired = true;
                return Ok(self
                    .on_complete
                    .lock()
                    .map_err(|_| poisoned("completion"))?
                    .take());
            }
        }
        Ok(None)
    }
}

/// Drain the context's queue with `workers` concurrent tasks. A handler
/// error fails that item only; the run continues and the error is logged.
/// At least one worker always runs, so the completion callback fires even
/// for an empty queue.
pub async fn run<T, S, F, Fut>(
    ctx: Arc<PipelineContext<T, S>>,
    workers: usize,
    handler: F,
) -> Result<()>
where
    T: Send + 'static,
    S: Send + 'static,
    F: Fn(T, Arc<PipelineContext<T, S>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let workers = workers.max(1);
    ctx.register_all(workers)?;

    let handler = Arc::new(handler);
    let mut handles = Vec::with_capacity(workers);

    for id in 0..workers {
        let ctx = Arc::clone(&ctx);
        let handler = Arc::clone(&handler);
        handles.push(tokio::spawn(async move {
            loop {
                let Some(item) = ctx.next_item()? else { break };
                if let Err(err) = handler(item, Arc::clone(&ctx)).await {
                    tracing::warn!(worker = id, error = %err, "pipeline item failed");
                }
            }
            if let Some(complete) = ctx.deregister(id)? {
                ctx.with_shared(|shared| complete(shared))?;
            }
            Ok::<(), SrcWikiError>(())
        }));
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| SrcWikiError::Pipeline(format!("worker join failed: {e}")))??;
    }
    Ok(())
}

/// Recover the accumulator after [`run`] has returned and all other handles
/// to the context are gone.
pub fn into_shared<T, S>(ctx: Arc<PipelineContext<T, S>>) -> Result<S> {
    let ctx = Arc::try_unwrap(ctx)
        .map_err(|_| SrcWikiError::Pipeline("pipeline context still shared".into()))?;
    ctx.shared.into_inner().map_err(|_| poisoned("shared"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_each_item_processed_once() {
        let ctx = Arc::new(PipelineContext::new((0..100u32).collect(), Vec::<u32>::new()));
        run(Arc::clone(&ctx), 4, |item, ctx| async move {
            ctx.with_shared(|seen| seen.push(item))?;
            Ok(())
        })
        .await
        .unwrap();

        let mut seen = into_shared(ctx).unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_completion_fires_exactly_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        // More workers than items forces several workers to deregister
        // without ever processing anything.
        let ctx = Arc::new(
            PipelineContext::new(vec![1u32, 2], ())
                .with_on_complete(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        );
        run(ctx, 8, |_, _| async { Ok(()) }).await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_empty_queue_still_completes() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let ctx = Arc::new(
            PipelineContext::new(Vec::<u32>::new(), 0usize)
                .with_on_complete(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        );
        run(Arc::clone(&ctx), 4, |_, _| async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(into_shared(ctx).unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_item_failure_does_not_abort_run() {
        let ctx = Arc::new(PipelineContext::new((0..10u32).collect(), Vec::<u32>::new()));
        run(Arc::clone(&ctx), 3, |item, ctx| async move {
            if item % 2 == 1 {
                return Err(SrcWikiError::Pipeline("odd item".into()));
            }
            ctx.with_shared(|seen| seen.push(item))?;
            Ok(())
        })
        .await
        .unwrap();

        let mut seen = into_shared(ctx).unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 2, 4, 6, 8]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_completion_sees_final_state() {
        let ctx = Arc::new(
            PipelineContext::new((0..50u32).collect(), (Vec::<u32>::new(), false))
                .with_on_complete(|state| {
                    // All folds happen before completion.
                    state.1 = state.0.len() == 50;
                }),
        );
        run(Arc::clone(&ctx), 4, |item, ctx| async move {
            ctx.with_shared(|state| state.0.push(item))?;
            Ok(())
        })
        .await
        .unwrap();

        let (_, complete_saw_all) = into_shared(ctx).unwrap();
        assert!(complete_saw_all);
    }

    #[tokio::test]
    async fn test_zero_workers_clamped_to_one() {
        let ctx = Arc::new(PipelineContext::new(vec![7u32], Vec::<u32>::new()));
        run(Arc::clone(&ctx), 0, |item, ctx| async move {
            ctx.with_shared(|seen| seen.push(item))?;
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(into_shared(ctx).unwrap(), vec![7]);
    }
}
