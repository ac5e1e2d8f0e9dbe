use hd_core::Result;

pub mod models;

/// Which summarizer to build and how to reach it.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    /// Model id sent to the remote API, e.g. `gpt-4o-mini` or `llama3`.
    pub model_id: Option<String>,
}

impl Config {
    pub fn new(api_key: Option<String>, model_name: Option<String>, base_url: Option<String>) -> Self {
        Self {
            api_key,
            model_name,
            base_url,
            model_id: None,
        }
    }

    pub fn with_model_id(mut self, model_id: Option<String>) -> Self {
        self.model_id = model_id.filter(|id| !id.trim().is_empty());
        self
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use super::models::{dummy::DummyModel, openai::OpenAiModel};
    pub use hd_core::{Error, Result, Summarizer, Summary};
}

pub use models::create_model;
