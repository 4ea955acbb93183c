// THEORY:
// The `parallel_pipeline` keeps long analyses (k-means over millions of pixels)
// off the caller's flow. It has two layers:
//
// 1.  **`WorkerPool`**: a dispatcher task receives self-contained `AnalysisTask`
//     messages and hands them round-robin to N worker tasks. A task carries
//     everything it needs (kind, a `PixelBuffer` handle sharing the same
//     `Arc<[u8]>`, metadata, a `oneshot` reply channel), so workers share no
//     mutable state. The numeric kernel itself runs on `spawn_blocking` so the
//     async runtime never stalls behind it.
// 2.  **`AnalysisSession`**: tracks which image is current. Each `select_image`
//     issues a fresh `ImageTag`; the last image *started* wins. Results are
//     checked against the current tag when they come back, and anything computed
//     for a replaced image is returned as `AnalysisError::Superseded` instead of
//     being applied.
//
// The pool is an owned value. Dropping it (or calling `shutdown`) closes the
// dispatcher, which in turn closes every worker.

use crate::config::AnalysisConfig;
use crate::core_modules::image_stats::ImageMetadata;
use crate::core_modules::pixel::pixel::PixelBuffer;
use crate::error::{AnalysisError, Result};
use crate::pipeline::{AnalysisKind, AnalysisOutcome, AnalysisPipeline};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Identity of one selected image within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageTag(u64);

impl ImageTag {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image #{}", self.0)
    }
}

pub struct AnalysisTask {
    pub tag: ImageTag,
    pub kind: AnalysisKind,
    pub buffer: PixelBuffer,
    pub metadata: Arc<ImageMetadata>,
    pub result_sender: oneshot::Sender<Result<AnalysisOutcome>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    completed_tasks: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Must be called from within a tokio runtime.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let worker_count = config.worker_pool_size;
        let pipeline = Arc::new(AnalysisPipeline::new(config)?);
        let completed_tasks = Arc::new(AtomicU64::new(0));

        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_index = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_index].send(task) {
                    let _ = task
                        .result_sender
                        .send(Err(AnalysisError::worker_pool("worker has shut down")));
                }
                worker_index = (worker_index + 1) % worker_count;
            }
        });

        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_id, mut worker_receiver)| {
                let pipeline = Arc::clone(&pipeline);
                let completed_tasks = Arc::clone(&completed_tasks);
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        log::debug!("worker {} running {:?} for {}", worker_id, task.kind, task.tag);
                        let result = Self::process_task_worker(Arc::clone(&pipeline), &task).await;
                        completed_tasks.fetch_add(1, Ordering::Relaxed);
                        let _ = task.result_sender.send(result);
                    }
                })
            })
            .collect();

        log::debug!("worker pool started with {} workers", worker_count);
        Ok(Self {
            task_sender,
            dispatcher,
            workers,
            completed_tasks,
        })
    }

    async fn process_task_worker(
        pipeline: Arc<AnalysisPipeline>,
        task: &AnalysisTask,
    ) -> Result<AnalysisOutcome> {
        let kind = task.kind;
        let buffer = task.buffer.clone();
        let metadata = Arc::clone(&task.metadata);
        tokio::task::spawn_blocking(move || pipeline.run(kind, &buffer, &metadata))
            .await
            .map_err(|e| AnalysisError::worker_pool(format!("analysis task failed: {e}")))?
    }

    /// Queues one analysis and waits for its result.
    pub async fn submit(
        &self,
        tag: ImageTag,
        kind: AnalysisKind,
        buffer: PixelBuffer,
        metadata: Arc<ImageMetadata>,
    ) -> Result<AnalysisOutcome> {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = AnalysisTask {
            tag,
            kind,
            buffer,
            metadata,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| AnalysisError::worker_pool("failed to send task to worker pool"))?;

        result_receiver
            .await
            .map_err(|_| AnalysisError::worker_pool("failed to receive result from worker"))?
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn completed_tasks(&self) -> u64 {
        self.completed_tasks.load(Ordering::Relaxed)
    }

    /// Closes the task queue and waits for queued work to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

struct SelectedImage {
    tag: ImageTag,
    buffer: PixelBuffer,
    metadata: Arc<ImageMetadata>,
}

struct SessionState {
    next_id: u64,
    current: Option<SelectedImage>,
}

/// Runs analyses for whichever image is currently selected.
pub struct AnalysisSession {
    worker_pool: WorkerPool,
    state: Arc<RwLock<SessionState>>,
}

impl AnalysisSession {
    /// Must be called from within a tokio runtime.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self {
            worker_pool: WorkerPool::new(config)?,
            state: Arc::new(RwLock::new(SessionState {
                next_id: 1,
                current: None,
            })),
        })
    }

    /// Makes `buffer` the current image. Results for earlier images become stale.
    pub async fn select_image(&self, buffer: PixelBuffer, metadata: ImageMetadata) -> ImageTag {
        let mut state = self.state.write().await;
        let tag = ImageTag(state.next_id);
        state.next_id += 1;
        log::info!(
            "selected {} ({}x{}, {})",
            tag,
            buffer.width(),
            buffer.height(),
            metadata.mime_type
        );
        state.current = Some(SelectedImage {
            tag,
            buffer,
            metadata: Arc::new(metadata),
        });
        tag
    }

    pub async fn current_tag(&self) -> Option<ImageTag> {
        self.state.read().await.current.as_ref().map(|image| image.tag)
    }

    /// Runs `kinds` concurrently for the image identified by `tag`.
    ///
    /// Results come back in the order of `kinds`. Each one is `Superseded` if
    /// another image was selected before it finished.
    pub async fn analyze(&self, tag: ImageTag, kinds: &[AnalysisKind]) -> Vec<Result<AnalysisOutcome>> {
        let snapshot = {
            let state = self.state.read().await;
            match &state.current {
                Some(image) if image.tag == tag => {
                    Ok((image.buffer.clone(), Arc::clone(&image.metadata)))
                }
                Some(image) => Err(image.tag),
                None => Err(ImageTag(0)),
            }
        };

        let (buffer, metadata) = match snapshot {
            Ok(snapshot) => snapshot,
            Err(current) => {
                log::warn!("{} is not the current selection, nothing submitted", tag);
                return kinds
                    .iter()
                    .map(|_| Err(superseded(tag, current)))
                    .collect();
            }
        };

        let submissions = kinds.iter().map(|&kind| {
            let buffer = buffer.clone();
            let metadata = Arc::clone(&metadata);
            async move {
                let result = self.worker_pool.submit(tag, kind, buffer, metadata).await;
                self.discard_if_stale(tag, kind, result).await
            }
        });

        join_all(submissions).await
    }

    async fn discard_if_stale(
        &self,
        tag: ImageTag,
        kind: AnalysisKind,
        result: Result<AnalysisOutcome>,
    ) -> Result<AnalysisOutcome> {
        let current = self.current_tag().await;
        match current {
            Some(current) if current == tag => result,
            other => {
                log::warn!("discarding {:?} result for replaced {}", kind, tag);
                Err(superseded(tag, other.unwrap_or(ImageTag(0))))
            }
        }
    }

    pub fn worker_pool(&self) -> &WorkerPool {
        &self.worker_pool
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}

fn superseded(requested: ImageTag, current: ImageTag) -> AnalysisError {
    AnalysisError::Superseded {
        requested: requested.id(),
        current: current.id(),
    }
}
