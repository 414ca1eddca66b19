use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use docfields::config::{self, ProviderKind, ServeArgs, ServerConfig};
use docfields::handler::AppState;
use docfields::providers::mock::MockProvider;
use docfields::providers::openai::{OpenAiConfig, OpenAiProvider};
use docfields::providers::ModelProvider;
use docfields::{logging, server};

#[derive(Debug, Parser)]
#[command(
    name = "docfields",
    version,
    about = "HTTP service that asks an LLM which fillable fields a document contains"
)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = config::resolve(&cli.serve)?;
    logging::init(&cfg.log_level);

    match cfg.provider {
        ProviderKind::Openai => {
            let api_key = config::load_api_key(&cfg.api_key_env)?;
            let provider = OpenAiProvider::new(OpenAiConfig {
                api_base: cfg.api_base.clone(),
                api_key,
                request_timeout_ms: cfg.request_timeout_ms,
                connect_timeout_ms: cfg.connect_timeout_ms,
            })?;
            info!(api_base = %cfg.api_base, "using OpenAI-compatible provider");
            run(&cfg, provider).await
        }
        ProviderKind::Mock => {
            warn!("mock provider enabled; responses are canned");
            run(&cfg, MockProvider::new()).await
        }
    }
}

async fn run<P: ModelProvider + 'static>(cfg: &ServerConfig, provider: P) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(provider, cfg.model.clone()));
    let listener = server::bind(cfg.bind).await?;
    server::serve(listener, state).await
}
