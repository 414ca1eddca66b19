use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::prompt::build_request;
use crate::providers::ModelProvider;
use crate::sanitize::sanitize_model_output;
use crate::types::{AnalysisResponse, ErrorResponse};

pub const MISSING_DOCUMENT_MESSAGE: &str = "Document text is required";
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze document";

/// Immutable per-process state shared by every request.
#[derive(Debug)]
pub struct AppState<P> {
    pub provider: P,
    pub model: String,
}

impl<P: ModelProvider> AppState<P> {
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[derive(Debug)]
pub enum AnalyzeError {
    Validation,
    Provider(anyhow::Error),
}

impl AnalyzeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller; provider causes stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation => MISSING_DOCUMENT_MESSAGE,
            Self::Provider(_) => ANALYSIS_FAILED_MESSAGE,
        }
    }
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "{MISSING_DOCUMENT_MESSAGE}"),
            Self::Provider(e) => write!(f, "{ANALYSIS_FAILED_MESSAGE}: {e:#}"),
        }
    }
}

impl std::error::Error for AnalyzeError {}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Pulls `documentText` out of a parsed body as prompt text.
///
/// Falsy values (missing, null, `""`, `false`, `0`) are rejected; anything
/// else is stringified the way a template literal would render it.
pub fn extract_document_text(body: &Value) -> Option<Cow<'_, str>> {
    let value = body.get("documentText")?;
    if is_falsy(value) {
        return None;
    }
    Some(match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(template_string(other)),
    })
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn template_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => template_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

pub async fn analyze_document<P: ModelProvider>(
    State(state): State<Arc<AppState<P>>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AnalysisResponse>, AnalyzeError> {
    let request_id = Uuid::new_v4().to_string();
    let outcome = match body {
        Ok(body) => run_analysis(&state, &body, &request_id).await,
        Err(rejection) => Err(AnalyzeError::Provider(anyhow::anyhow!(
            "failed to read request body: {rejection}"
        ))),
    };
    match outcome {
        Ok(analysis) => Ok(Json(AnalysisResponse { analysis })),
        Err(AnalyzeError::Validation) => {
            info!(%request_id, "rejected request without document text");
            Err(AnalyzeError::Validation)
        }
        Err(e) => {
            error!(%request_id, "error analyzing document: {e}");
            Err(e)
        }
    }
}

async fn run_analysis<P: ModelProvider>(
    state: &AppState<P>,
    body: &[u8],
    request_id: &str,
) -> Result<String, AnalyzeError> {
    let parsed: Value = serde_json::from_slice(body).map_err(|e| {
        AnalyzeError::Provider(anyhow::Error::new(e).context("invalid request body"))
    })?;
    if parsed.is_null() {
        return Err(AnalyzeError::Provider(anyhow::anyhow!("request body is JSON null")));
    }
    let document_text = extract_document_text(&parsed).ok_or(AnalyzeError::Validation)?;

    let req = build_request(&state.model, &document_text);
    let resp = state
        .provider
        .generate(req)
        .await
        .map_err(AnalyzeError::Provider)?;

    if let Some(usage) = resp.usage {
        info!(
            %request_id,
            prompt_tokens = ?usage.prompt_tokens,
            completion_tokens = ?usage.completion_tokens,
            total_tokens = ?usage.total_tokens,
            "provider usage"
        );
    }
    let sanitized = sanitize_model_output(&resp.text);
    info!(%request_id, raw = ?resp.text, "model raw output");
    info!(%request_id, sanitized = ?sanitized, "model sanitized output");
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::{extract_document_text, AnalyzeError};

    #[test]
    fn falsy_document_text_is_rejected() {
        assert_eq!(extract_document_text(&json!({})), None);
        assert_eq!(extract_document_text(&json!({"documentText": null})), None);
        assert_eq!(extract_document_text(&json!({"documentText": ""})), None);
        assert_eq!(extract_document_text(&json!({"documentText": false})), None);
        assert_eq!(extract_document_text(&json!({"documentText": 0})), None);
        assert_eq!(extract_document_text(&json!({"documentText": 0.0})), None);
        assert_eq!(extract_document_text(&json!(["documentText"])), None);
    }

    #[test]
    fn truthy_document_text_is_rendered_as_text() {
        let text = |v: serde_json::Value| extract_document_text(&v).map(|t| t.into_owned());
        assert_eq!(text(json!({"documentText": "W-9"})).as_deref(), Some("W-9"));
        assert_eq!(text(json!({"documentText": "  "})).as_deref(), Some("  "));
        assert_eq!(text(json!({"documentText": 12})).as_deref(), Some("12"));
        assert_eq!(text(json!({"documentText": 2.5})).as_deref(), Some("2.5"));
        assert_eq!(text(json!({"documentText": 3.0})).as_deref(), Some("3"));
        assert_eq!(text(json!({"documentText": true})).as_deref(), Some("true"));
        assert_eq!(
            text(json!({"documentText": ["a", null, 1]})).as_deref(),
            Some("a,,1")
        );
        assert_eq!(
            text(json!({"documentText": {"page": 1}})).as_deref(),
            Some("[object Object]")
        );
    }

    #[test]
    fn errors_map_to_status_and_generic_message() {
        let v = AnalyzeError::Validation;
        assert_eq!(v.status(), StatusCode::BAD_REQUEST);
        assert_eq!(v.public_message(), "Document text is required");

        let p = AnalyzeError::Provider(anyhow::anyhow!("upstream exploded: key sk-123"));
        assert_eq!(p.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(p.public_message(), "Failed to analyze document");
        assert!(p.to_string().contains("upstream exploded"));
    }
}
