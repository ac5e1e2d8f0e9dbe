use std::sync::Arc;
use hd_core::DigestStore;
use hd_digest::{DigestPipeline, ReactionProcessor, Shutdown};

pub struct AppState {
    pub pipeline: Arc<DigestPipeline>,
    pub reactions: ReactionProcessor,
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(pipeline: Arc<DigestPipeline>, shutdown: Shutdown) -> Self {
        let reactions = ReactionProcessor::new(pipeline.store(), pipeline.config());
        Self {
            pipeline,
            reactions,
            shutdown,
        }
    }

    pub fn store(&self) -> Arc<dyn DigestStore> {
        self.pipeline.store()
    }
}
