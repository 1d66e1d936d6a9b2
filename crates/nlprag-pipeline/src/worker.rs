//! Background worker pool.

use std::sync::Arc;
use std::thread::JoinHandle;

use nlprag_core::{Error, InferenceRequest, Result, TaskId};
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{ExecutionMode, Pipeline, PipelineConfig, TRACING_TARGET_WORKER};

/// A request accepted for background processing.
#[derive(Debug)]
struct Job {
    task_id: TaskId,
    request: InferenceRequest,
}

/// Cloneable handle that queues requests on a [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Job>,
    cancel_token: CancellationToken,
}

impl JobQueue {
    /// Queues `request` and returns the identity it will be cached under.
    pub fn submit(&self, request: InferenceRequest) -> Result<TaskId> {
        request.validate()?;

        if self.cancel_token.is_cancelled() {
            return Err(Error::internal().with_message("background workers are shutting down"));
        }

        let task_id = TaskId::generate();
        let job = Job {
            task_id: task_id.clone(),
            request,
        };

        self.sender
            .send(job)
            .map_err(|_| Error::internal().with_message("background workers have stopped"))?;

        tracing::debug!(
            target: TRACING_TARGET_WORKER,
            task_id = %task_id,
            "Queued background job"
        );
        Ok(task_id)
    }

    /// Returns whether the pool still accepts jobs.
    pub fn is_accepting(&self) -> bool {
        !self.cancel_token.is_cancelled() && !self.sender.is_closed()
    }
}

/// Runs background requests on a dedicated runtime thread.
///
/// Jobs are queued without bound and at most `max_concurrent_jobs` run at
/// once. A slow job never occupies request-handling threads.
pub struct WorkerPool {
    queue: JobQueue,
    stopped: Option<oneshot::Receiver<()>>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("accepting", &self.queue.is_accepting())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Starts the worker thread and its runtime.
    pub fn spawn(pipeline: Pipeline, config: &PipelineConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("nlprag-worker")
            .enable_all()
            .build()
            .map_err(|e| {
                Error::internal()
                    .with_message("failed to build worker runtime")
                    .with_source(e)
            })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let (stopped_tx, stopped_rx) = oneshot::channel();
        let cancel_token = CancellationToken::new();
        let semaphore = config.create_semaphore();

        tracing::info!(
            target: TRACING_TARGET_WORKER,
            worker_threads = config.worker_threads.max(1),
            max_concurrent_jobs = config.max_concurrent_jobs,
            "Starting background workers"
        );

        let token = cancel_token.clone();
        let thread = std::thread::Builder::new()
            .name("nlprag-worker-pool".to_owned())
            .spawn(move || {
                runtime.block_on(run(pipeline, receiver, token, semaphore));
                let _ = stopped_tx.send(());
            })
            .map_err(|e| {
                Error::internal()
                    .with_message("failed to spawn worker thread")
                    .with_source(e)
            })?;

        Ok(Self {
            queue: JobQueue {
                sender,
                cancel_token,
            },
            stopped: Some(stopped_rx),
            thread: Some(thread),
        })
    }

    /// Queues `request` and returns the identity it will be cached under.
    pub fn submit(&self, request: InferenceRequest) -> Result<TaskId> {
        self.queue.submit(request)
    }

    /// Returns a handle for queueing jobs from request handlers.
    pub fn queue(&self) -> JobQueue {
        self.queue.clone()
    }

    /// Stops accepting jobs and waits until every queued job has finished.
    pub async fn shutdown(mut self) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET_WORKER,
            "Initiating graceful shutdown of background workers"
        );
        self.queue.cancel_token.cancel();

        if let Some(stopped) = self.stopped.take() {
            let _ = stopped.await;
        }

        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|e| Error::internal().with_message(e.to_string()))?
                .map_err(|_| Error::internal().with_message("worker thread panicked"))?;
        }

        tracing::info!(target: TRACING_TARGET_WORKER, "Background workers stopped");
        Ok(())
    }
}

/// Receives jobs until cancelled, then drains the queue.
async fn run(
    pipeline: Pipeline,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    cancel_token: CancellationToken,
    semaphore: Arc<Semaphore>,
) {
    let mut jobs = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            () = cancel_token.cancelled() => break,

            Some(joined) = jobs.join_next(), if !jobs.is_empty() => log_join(joined),

            job = receiver.recv() => match job {
                Some(job) => start(&pipeline, &semaphore, &mut jobs, job).await,
                None => break,
            },
        }
    }

    receiver.close();
    let mut drained = 0_usize;
    while let Some(job) = receiver.recv().await {
        start(&pipeline, &semaphore, &mut jobs, job).await;
        drained += 1;
    }

    tracing::info!(
        target: TRACING_TARGET_WORKER,
        drained,
        in_flight = jobs.len(),
        "Draining background jobs"
    );

    while let Some(joined) = jobs.join_next().await {
        log_join(joined);
    }
}

async fn start(
    pipeline: &Pipeline,
    semaphore: &Arc<Semaphore>,
    jobs: &mut JoinSet<()>,
    job: Job,
) {
    let permit = match semaphore.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_WORKER,
                task_id = %job.task_id,
                error = %err,
                "Failed to acquire job permit"
            );
            return;
        }
    };

    let pipeline = pipeline.clone();
    jobs.spawn(async move {
        let _permit = permit;
        let Job { task_id, request } = job;

        tracing::info!(
            target: TRACING_TARGET_WORKER,
            task_id = %task_id,
            task = %request.task,
            "Processing background job"
        );

        match pipeline
            .run(task_id.clone(), &request, ExecutionMode::Background)
            .await
        {
            Ok(_) => {
                tracing::info!(
                    target: TRACING_TARGET_WORKER,
                    task_id = %task_id,
                    "Background job completed"
                );
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_WORKER,
                    task_id = %task_id,
                    error = %err,
                    "Background job failed"
                );
            }
        }
    });
}

fn log_join(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        tracing::error!(
            target: TRACING_TARGET_WORKER,
            error = %err,
            "Background job panicked"
        );
    }
}
