pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod scraper;

use std::sync::Arc;
use config::Config;
use pipeline::Pipeline;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Builds the production pipeline from configuration.
    pub fn from_config(config: Config) -> error::Result<Self> {
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self::new(config, pipeline))
    }
}
