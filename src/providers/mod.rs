pub mod mock;
pub mod openai;

use async_trait::async_trait;

use crate::types::{GenerateRequest, GenerateResponse};

/// Text-generation capability the analyze handler delegates to.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

