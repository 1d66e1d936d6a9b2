use nlprag_pipeline::{JobQueue, Pipeline};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    pipeline: Pipeline,
    jobs: JobQueue,
}

impl ServiceState {
    /// Creates the state from a ready pipeline and the worker pool's queue.
    pub fn new(pipeline: Pipeline, jobs: JobQueue) -> Self {
        Self { pipeline, jobs }
    }

    /// Returns the pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the background job queue.
    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(pipeline: Pipeline);
impl_di!(jobs: JobQueue);
