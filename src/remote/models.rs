//! `ModelListClient`: lists models of an OpenAI-compatible provider.
//!
//! Works with any endpoint that serves `GET {base_url}/models` in the OpenAI
//! wire format (Groq, OpenAI, vLLM, LM Studio, faster-whisper-server, …).
//! Connection details are passed per call; nothing is hardcoded.

use std::time::Duration;

use crate::remote::{build_client, check_status, endpoint_url, with_auth};
use crate::settings::backend::BackendError;

/// Per-request timeout used by [`ModelListClient::new`].
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP client for provider model listings.
#[derive(Debug, Clone)]
pub struct ModelListClient {
    client: reqwest::Client,
}

impl ModelListClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
        }
    }

    /// Fetch the model ids offered at `base_url`.
    pub async fn list_models(
        &self,
        base_url: &str,
        api_key: &str,
    ) -> Result<Vec<String>, BackendError> {
        let url = models_url(base_url);

        let response = with_auth(self.client.get(&url), api_key).send().await?;
        let response = check_status(response, &url).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        let models = parse_model_list(&json);
        log::info!("{} models listed at {url}", models.len());
        Ok(models)
    }
}

impl Default for ModelListClient {
    fn default() -> Self {
        Self::new()
    }
}

fn models_url(base_url: &str) -> String {
    endpoint_url(base_url, "models")
}

/// Extract model ids from a listing response.
///
/// Accepts `{"data": [{"id": …}, …]}` (entries may use `name` instead of
/// `id`) and a plain array of strings.  Anything else yields an empty list.
pub fn parse_model_list(json: &serde_json::Value) -> Vec<String> {
    let entries = match json.get("data").unwrap_or(json).as_array() {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            serde_json::Value::String(id) => Some(id.as_str()),
            serde_json::Value::Object(obj) => obj
                .get("id")
                .or_else(|| obj.get("name"))
                .and_then(serde_json::Value::as_str),
            _ => None,
        })
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::test_server::serve_once;
    use serde_json::json;
    use tokio::net::TcpListener;

    #[test]
    fn parses_openai_style_listing() {
        let json = json!({
            "object": "list",
            "data": [
                { "id": "whisper-large-v3", "object": "model" },
                { "name": "distil-whisper-large-v3-en" },
                { "object": "model" }
            ]
        });
        assert_eq!(
            parse_model_list(&json),
            vec!["whisper-large-v3", "distil-whisper-large-v3-en"]
        );
    }

    #[test]
    fn parses_plain_string_array() {
        assert_eq!(parse_model_list(&json!(["a", "", "b"])), vec!["a", "b"]);
    }

    #[test]
    fn unexpected_shapes_yield_empty_list() {
        assert!(parse_model_list(&json!({ "models": ["a"] })).is_empty());
        assert!(parse_model_list(&json!("whisper-1")).is_empty());
        assert!(parse_model_list(&json!({ "data": { "id": "x" } })).is_empty());
    }

    #[test]
    fn url_drops_trailing_slash() {
        assert_eq!(models_url("https://api.groq.com/openai/v1/"), "https://api.groq.com/openai/v1/models");
        assert_eq!(models_url(" http://localhost:8000/v1 "), "http://localhost:8000/v1/models");
    }

    #[tokio::test]
    async fn lists_models_with_bearer_auth() {
        let (base_url, server) = serve_once("200 OK", r#"{"data":[{"id":"whisper-1"}]}"#).await;

        let models = ModelListClient::new().list_models(&base_url, "sk-test").await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(models, vec!["whisper-1"]);
        assert!(request.starts_with("GET /v1/models "));
        assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
    }

    #[tokio::test]
    async fn empty_key_sends_no_authorization() {
        let (base_url, server) = serve_once("200 OK", r#"["local-model"]"#).await;

        let models = ModelListClient::new().list_models(&base_url, "").await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(models, vec!["local-model"]);
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn requests_identify_the_app() {
        let (base_url, server) = serve_once("200 OK", "[]").await;

        ModelListClient::new().list_models(&base_url, "").await.unwrap();
        let request = server.await.unwrap().to_lowercase();

        assert!(request.contains("x-title: cloud-stt-settings\r\n"));
        assert!(request.contains("referer: app://cloud-stt-settings\r\n"));
        assert!(request.contains("user-agent: cloud-stt-settings/"));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (base_url, server) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;

        let err = ModelListClient::new().list_models(&base_url, "nope").await.unwrap_err();
        server.await.unwrap();

        assert_eq!(
            err,
            BackendError::Status {
                status: 401,
                body: r#"{"error":"bad key"}"#.into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = ModelListClient::new()
            .list_models(&format!("http://127.0.0.1:{port}/v1"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Request(_)));
    }
}
