use std::sync::Arc;
use hd_core::{Error, Result, Summarizer};
use tracing::info;
use crate::Config;

pub mod dummy;
pub mod openai;

use dummy::DummyModel;
use openai::OpenAiModel;

/// Pick a summarizer from `config.model_name`. With no name, an API key
/// selects the remote model and its absence the offline one.
pub fn create_model(config: Config) -> Result<Arc<dyn Summarizer>> {
    let name = match config.model_name.as_deref() {
        Some(name) => name.to_lowercase(),
        None if config.api_key.is_some() => "openai".to_string(),
        None => "dummy".to_string(),
    };

    let model: Arc<dyn Summarizer> = match name.as_str() {
        "dummy" => Arc::new(DummyModel::new()),
        "openai" => Arc::new(openai_model(config)?),
        other => return Err(Error::Config(format!("Unknown model: {}", other))),
    };
    info!("Using summarizer: {}", model.name());
    Ok(model)
}

fn openai_model(config: Config) -> Result<OpenAiModel> {
    let model = OpenAiModel::new(config.api_key, config.base_url)?;
    Ok(match config.model_id {
        Some(id) => model.with_model(id),
        None => model,
    })
}
