//! Pipeline orchestrator.

use futures::future::join_all;
use jiff::Timestamp;
use nlprag_core::{
    BatchItem, BatchResult, ErrorKind, InferenceRequest, InferenceResult, Result, TaskId,
    TaskKind, TaskOutput, TaskResult,
};
use nlprag_vector::TextFilter;

use crate::{PipelineContext, TRACING_TARGET, parse_or_stub};

/// Where a pipeline run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// A caller is waiting for the result.
    Synchronous,
    /// A background worker runs the request out-of-band.
    Background,
}

impl ExecutionMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Synchronous => "synchronous",
            Self::Background => "background",
        }
    }
}

/// Runs requests through inference, retrieval, rerank, indexing and caching.
///
/// Cheap to clone; clones share the [`PipelineContext`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    ctx: PipelineContext,
}

impl Pipeline {
    /// Creates a pipeline over the given context.
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Returns the application context.
    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Processes `request` under `task_id` and caches the result.
    ///
    /// Both execution modes share this function. A requested webhook is
    /// delivered from a detached task for synchronous runs and inline for
    /// background runs; it never affects the returned result.
    #[tracing::instrument(
        skip(self, request),
        fields(task = %request.task, mode = mode.as_str(), batch = request.is_batch()),
        target = TRACING_TARGET
    )]
    pub async fn run(
        &self,
        task_id: TaskId,
        request: &InferenceRequest,
        mode: ExecutionMode,
    ) -> Result<TaskResult> {
        request.validate()?;
        let started_at = Timestamp::now();

        let result = match &request.batch {
            Some(texts) => self.process_batch(task_id, request, texts).await?,
            None => self.process(task_id, request).await?,
        };

        self.write_through(&result).await;

        tracing::info!(
            target: TRACING_TARGET,
            task_id = %result.task_id,
            task = %result.task,
            mode = mode.as_str(),
            elapsed_ms = Timestamp::now().duration_since(started_at).as_millis(),
            "Pipeline completed"
        );

        if let Some(url) = request.webhook_url.clone() {
            match mode {
                ExecutionMode::Synchronous => {
                    let pipeline = self.clone();
                    let result = result.clone();
                    tokio::spawn(async move { pipeline.notify(&url, &result).await });
                }
                ExecutionMode::Background => self.notify(&url, &result).await,
            }
        }

        Ok(result)
    }

    /// Returns the cached result of a submission, if still present.
    pub async fn lookup(&self, task_id: &TaskId, kind: TaskKind) -> Result<Option<TaskResult>> {
        Ok(self.ctx.cache.get(&task_id.cache_key(kind)).await?)
    }

    /// Single-item path: inference and retrieval, rerank, index.
    async fn process(&self, task_id: TaskId, request: &InferenceRequest) -> Result<TaskResult> {
        let (output, candidates) = tokio::join!(
            self.infer(request, &request.text),
            self.retrieve(request),
        );
        let output = output?;
        let candidates = candidates?;

        let related_docs = self.ctx.reranker.rerank(&request.text, candidates).await;
        let result = InferenceResult::new(output, related_docs);

        self.index(request.task, &request.text, &result).await?;

        Ok(TaskResult::single(task_id, request.task, result))
    }

    /// Batch path: concurrent inference only, per-item failures captured.
    async fn process_batch(
        &self,
        task_id: TaskId,
        request: &InferenceRequest,
        texts: &[String],
    ) -> Result<TaskResult> {
        let outcomes = join_all(texts.iter().map(|text| async move {
            let item = match self.infer(request, text).await {
                Ok(output) => BatchItem::Completed(output),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        task = %request.task,
                        error = %error,
                        "Batch item failed"
                    );
                    BatchItem::Failed {
                        error: error.to_string(),
                    }
                }
            };
            (text.clone(), item)
        }))
        .await;

        let batch: BatchResult = outcomes.into_iter().collect();
        tracing::debug!(
            target: TRACING_TARGET,
            inputs = texts.len(),
            distinct = batch.len(),
            failed = batch.batch_results.values().filter(|i| !i.is_completed()).count(),
            "Batch processed"
        );

        Ok(TaskResult::batch(task_id, request.task, batch))
    }

    /// Calls the inference oracle once. Transport failures surface, unusable
    /// content falls back to the task's stub.
    async fn infer(&self, request: &InferenceRequest, text: &str) -> Result<TaskOutput> {
        let prompt = request.prompt_for(text);

        match self.ctx.inference.complete(request.task, &prompt).await {
            Ok(content) => Ok(parse_or_stub(request.task, &content)),
            Err(error) if error.kind() == ErrorKind::DataShape => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    task = %request.task,
                    error = %error,
                    "Inference returned no usable content, using default result"
                );
                Ok(request.task.fallback_output())
            }
            Err(error) => Err(error),
        }
    }

    /// Retrieves related documents for the request text.
    ///
    /// Upstream failures degrade to no documents. A query vector of the wrong
    /// dimensionality is a configuration problem and surfaces. The category
    /// filter applies to `classify` requests only.
    async fn retrieve(&self, request: &InferenceRequest) -> Result<Vec<String>> {
        let query = match self.ctx.embeddings.embed_one(&request.text).await {
            Ok(query) => query,
            Err(error) if error.kind() == ErrorKind::DataShape => return Err(error),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    task = %request.task,
                    error = %error,
                    "Query embedding failed, continuing without related documents"
                );
                return Ok(Vec::new());
            }
        };

        let filter = request.category_hint().map(TextFilter::contains);
        let documents = self
            .ctx
            .store
            .search(
                request.task.collection_name(),
                query,
                self.ctx.config.retrieval_limit,
                filter.as_ref(),
            )
            .await;

        Ok(documents.into_iter().map(|document| document.text).collect())
    }

    /// Appends the derived document for a finished result.
    async fn index(&self, kind: TaskKind, text: &str, result: &InferenceResult) -> Result<()> {
        let document = result.index_text(text)?;
        let vector = self.ctx.embeddings.embed_one(&document).await?;
        let ids = self
            .ctx
            .store
            .upsert(kind.collection_name(), vec![(document, vector)])
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            collection = kind.collection_name(),
            point_ids = ?ids,
            "Indexed result"
        );
        Ok(())
    }

    /// Caches a completed result. A failed write is logged only.
    async fn write_through(&self, result: &TaskResult) {
        if let Err(error) = self.ctx.cache.put(&result.cache_key(), result).await {
            tracing::error!(
                target: TRACING_TARGET,
                task_id = %result.task_id,
                error = %error,
                "Failed to cache result"
            );
        }
    }

    async fn notify(&self, url: &str, result: &TaskResult) {
        match &self.ctx.webhooks {
            Some(webhooks) => {
                webhooks.notify(url, result).await;
            }
            None => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    task_id = %result.task_id,
                    "Webhook requested but delivery is disabled"
                );
            }
        }
    }
}
