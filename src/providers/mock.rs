use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::providers::ModelProvider;
use crate::types::{GenerateRequest, GenerateResponse};

const MOCK_OK: &str = "mock: ok";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockProviderError {
    Scripted { message: String },
}

impl fmt::Display for MockProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scripted { message } => write!(f, "mock provider failure: {message}"),
        }
    }
}

impl std::error::Error for MockProviderError {}

#[derive(Debug, Clone)]
enum MockBehavior {
    Reply(String),
    Fail(String),
}

/// Deterministic stand-in for a live provider. Clones share the call log.
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    calls: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::replying(MOCK_OK)
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Reply(text.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Fail(message.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn build_response(&self) -> anyhow::Result<GenerateResponse> {
        match &self.behavior {
            MockBehavior::Reply(text) => Ok(GenerateResponse {
                text: text.clone(),
                usage: None,
            }),
            MockBehavior::Fail(message) => Err(anyhow!(MockProviderError::Scripted {
                message: message.clone()
            })),
        }
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(req);
        }
        self.build_response()
    }
}
