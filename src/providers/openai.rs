use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::providers::ModelProvider;
use crate::types::{GenerateRequest, GenerateResponse, TokenUsage};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: Secret<String>,
    /// 0 disables the overall request timeout.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl OpenAiConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_base: OPENAI_API_BASE.to_string(),
            api_key,
            request_timeout_ms: 0,
            connect_timeout_ms: 10_000,
        }
    }
}

/// Chat-completions client for OpenAI and API-compatible servers.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> anyhow::Result<Self> {
        let mut builder =
            Client::builder().connect_timeout(Duration::from_millis(config.connect_timeout_ms));
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

fn short_body(s: &str) -> String {
    s.chars().take(200).collect()
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let body = ChatCompletionRequest {
            model: &req.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &req.system,
                },
                ChatMessage {
                    role: "user",
                    content: &req.prompt,
                },
            ],
        };
        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("failed to read chat completion body")?;
        if !status.is_success() {
            return Err(anyhow!(
                "provider returned HTTP {}: {}",
                status.as_u16(),
                short_body(&text)
            ));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).context("invalid chat completion JSON")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion contained no choices"))?;
        let content = choice.message.content.unwrap_or_default();

        Ok(GenerateResponse {
            text: content,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}
