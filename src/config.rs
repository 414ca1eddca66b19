use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Args, ValueEnum};
use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::prompt::DEFAULT_MODEL;
use crate::providers::openai::OPENAI_API_BASE;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Openai,
    Mock,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// JSON or YAML file with server settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, env = "DOCFIELDS_BIND")]
    pub bind: Option<SocketAddr>,
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,
    #[arg(long, env = "DOCFIELDS_MODEL")]
    pub model: Option<String>,
    #[arg(long, env = "DOCFIELDS_API_BASE")]
    pub api_base: Option<String>,
    /// Environment variable holding the provider credential
    #[arg(long)]
    pub api_key_env: Option<String>,
    /// Overall provider request timeout; 0 waits indefinitely
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub bind: Option<SocketAddr>,
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub provider: ProviderKind,
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub log_level: String,
}

pub fn load_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    match serde_json::from_slice::<FileConfig>(&bytes) {
        Ok(cfg) => Ok(cfg),
        Err(_) => serde_yaml::from_slice::<FileConfig>(&bytes)
            .with_context(|| format!("invalid config {}", path.display())),
    }
}

/// Layers flags over the optional config file over built-in defaults.
pub fn resolve(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let file = match &args.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let bind = match args.bind.or(file.bind) {
        Some(addr) => addr,
        None => DEFAULT_BIND
            .parse()
            .map_err(|e| anyhow!("invalid default bind address: {e}"))?,
    };
    let model = args
        .model
        .clone()
        .or(file.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    if model.trim().is_empty() {
        anyhow::bail!("model must not be empty");
    }
    Ok(ServerConfig {
        bind,
        provider: args
            .provider
            .or(file.provider)
            .unwrap_or(ProviderKind::Openai),
        model,
        api_base: args
            .api_base
            .clone()
            .or(file.api_base)
            .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
        api_key_env: args
            .api_key_env
            .clone()
            .or(file.api_key_env)
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
        request_timeout_ms: args
            .request_timeout_ms
            .or(file.request_timeout_ms)
            .unwrap_or(0),
        connect_timeout_ms: args
            .connect_timeout_ms
            .or(file.connect_timeout_ms)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        log_level: args
            .log_level
            .clone()
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
    })
}

/// Reads the provider credential once; `.env` must already be loaded by the caller.
pub fn load_api_key(env_var: &str) -> anyhow::Result<Secret<String>> {
    match dotenvy::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(Secret::new(key)),
        Ok(_) => Err(anyhow!("{env_var} is set but empty")),
        Err(_) => Err(anyhow!(
            "{env_var} is not set; export it or add it to .env"
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use secrecy::ExposeSecret;
    use tempfile::tempdir;

    use super::{load_api_key, load_file_config, resolve, ProviderKind, ServeArgs};

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let cfg = resolve(&ServeArgs::default()).expect("resolve");
        assert_eq!(cfg.bind.to_string(), "127.0.0.1:3000");
        assert_eq!(cfg.provider, ProviderKind::Openai);
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.api_base, "https://api.openai.com/v1");
        assert_eq!(cfg.api_key_env, "OPENAI_API_KEY");
        assert_eq!(cfg.request_timeout_ms, 0);
        assert_eq!(cfg.connect_timeout_ms, 10_000);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn yaml_file_is_loaded_and_flags_override_it() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("docfields.yaml");
        fs::write(
            &path,
            "bind: 0.0.0.0:8080\nprovider: mock\nmodel: gpt-4o-mini\nrequest_timeout_ms: 30000\n",
        )
        .expect("write config");

        let args = ServeArgs {
            config: Some(path),
            model: Some("gpt-4.1".to_string()),
            ..Default::default()
        };
        let cfg = resolve(&args).expect("resolve");
        assert_eq!(cfg.bind.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.provider, ProviderKind::Mock);
        assert_eq!(cfg.model, "gpt-4.1");
        assert_eq!(cfg.request_timeout_ms, 30_000);
    }

    #[test]
    fn json_file_is_loaded() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("docfields.json");
        fs::write(&path, r#"{"api_base":"http://localhost:1234/v1","log_level":"debug"}"#)
            .expect("write config");
        let file = load_file_config(&path).expect("load");
        assert_eq!(file.api_base.as_deref(), Some("http://localhost:1234/v1"));
        assert_eq!(file.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("docfields.yaml");
        fs::write(&path, "modle: gpt-4o\n").expect("write config");
        assert!(load_file_config(&path).is_err());
    }

    #[test]
    fn empty_model_is_rejected() {
        let args = ServeArgs {
            model: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(resolve(&args).is_err());
    }

    #[test]
    fn api_key_is_read_from_named_variable() {
        std::env::set_var("DOCFIELDS_TEST_KEY_PRESENT", "sk-test");
        let key = load_api_key("DOCFIELDS_TEST_KEY_PRESENT").expect("key");
        assert_eq!(key.expose_secret(), "sk-test");

        std::env::set_var("DOCFIELDS_TEST_KEY_EMPTY", "");
        assert!(load_api_key("DOCFIELDS_TEST_KEY_EMPTY").is_err());
        assert!(load_api_key("DOCFIELDS_TEST_KEY_MISSING").is_err());
    }
}
