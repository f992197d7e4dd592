use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::SummarizationError;

const PROMPT_PREFIX: &str = "Summarize and enrich this content:\n\n";

/// Produces the enriched summary for a piece of text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationError>;
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

pub fn build_prompt(content: &str) -> String {
    let mut result = String::with_capacity(content.len() + PROMPT_PREFIX.len());
    result.push_str(PROMPT_PREFIX);
    result.push_str(content);
    result
}

/// Single-turn client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiSummarizer {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizationError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(SummarizationError::ClientBuild)?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SummarizationError> {
        Self::new(
            &config.openai_base_url,
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.summarize_timeout,
        )
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: build_prompt(text),
            }],
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(SummarizationError::from_reqwest)?;

        let status = res.status();
        let bytes = res.bytes().await.map_err(SummarizationError::from_reqwest)?;
        let json: Option<serde_json::Value> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            let message = json
                .as_ref()
                .and_then(|json| json["error"]["message"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).trim().to_string());
            return Err(SummarizationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json = json.ok_or_else(|| {
            SummarizationError::MalformedResponse("body is not valid JSON".to_string())
        })?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                SummarizationError::MalformedResponse(
                    "missing choices[0].message.content".to_string(),
                )
            })?
            .to_string();

        debug!(model = %self.model, chars = reply.len(), "received summary");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summarizer(server: &MockServer) -> OpenAiSummarizer {
        OpenAiSummarizer::new(
            &format!("{}/v1", server.uri()),
            "sk-test",
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    #[test]
    fn prompt_asks_to_summarize_and_enrich() {
        assert_eq!(
            build_prompt("Hello world"),
            "Summarize and enrich this content:\n\nHello world"
        );
    }

    #[tokio::test]
    async fn sends_one_user_message_and_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {
                        "role": "user",
                        "content": "Summarize and enrich this content:\n\nHello world"
                    }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("A greeting.")))
            .expect(1)
            .mount(&server)
            .await;

        let summary = summarizer(&server).summarize("Hello world").await.unwrap();
        assert_eq!(summary, "A greeting.");
    }

    #[tokio::test]
    async fn auth_failure_carries_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "message": "Incorrect API key provided",
                    "type": "invalid_request_error"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = summarizer(&server).summarize("text").await.unwrap_err();
        match err {
            SummarizationError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn quota_rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let err = summarizer(&server).summarize("text").await.unwrap_err();
        assert!(matches!(
            err,
            SummarizationError::Api { status: 429, ref message } if message == "rate limited"
        ));
    }

    #[tokio::test]
    async fn missing_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = summarizer(&server).summarize("text").await.unwrap_err();
        assert!(matches!(err, SummarizationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let summarizer = OpenAiSummarizer::new(
            &server.uri(),
            "sk-test",
            "gpt-4o-mini",
            Duration::from_millis(200),
        )
        .unwrap();
        let err = summarizer.summarize("text").await.unwrap_err();
        assert!(matches!(err, SummarizationError::Timeout));
    }
}
