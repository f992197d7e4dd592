use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use crate::api::models::{ConversionRequest, ConversionResult};
use crate::config::Config;
use crate::document::DocumentRenderer;
use crate::error::{AppError, Result};
use crate::llm::{OpenAiSummarizer, Summarizer};
use crate::scraper::{ContentFetcher, HttpFetcher};

/// Runs one conversion: fetch (when a URL is given), validate, summarize,
/// render. Stages run strictly in order and the first failure ends the
/// request.
pub struct Pipeline {
    fetcher: Arc<dyn ContentFetcher>,
    summarizer: Arc<dyn Summarizer>,
    renderer: DocumentRenderer,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        summarizer: Arc<dyn Summarizer>,
        renderer: DocumentRenderer,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            renderer,
        }
    }

    /// Wires the HTTP fetcher and the provider client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(config)?;
        let summarizer = OpenAiSummarizer::from_config(config)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(summarizer),
            DocumentRenderer::default(),
        ))
    }

    #[instrument(skip_all, fields(url = request.url()))]
    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult> {
        let original_text = self.resolve_text(request).await?;
        info!(chars = original_text.chars().count(), "resolved input text");

        let started = Instant::now();
        let summary = self.summarizer.summarize(&original_text).await?;
        info!(elapsed = ?started.elapsed(), chars = summary.chars().count(), "summary generated");

        let document = self.renderer.render(&original_text, &summary)?;
        info!(bytes = document.len(), "document rendered");

        Ok(ConversionResult {
            original_text,
            summary,
            document,
        })
    }

    /// A URL, when present, replaces any supplied text with the fetched
    /// content.
    async fn resolve_text(&self, request: &ConversionRequest) -> Result<String> {
        let text = match request.url() {
            Some(url) => {
                let started = Instant::now();
                let text = self.fetcher.fetch(url).await?;
                info!(url, elapsed = ?started.elapsed(), "fetched content");
                text
            }
            None => request.text.clone().unwrap_or_default(),
        };

        if text.trim().is_empty() {
            return Err(AppError::ValidationError);
        }
        Ok(text)
    }
}
