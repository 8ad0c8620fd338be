//! Provider HTTP access.
//!
//! * [`ModelListClient`] lists the models a provider offers.
//! * [`TranscriptionClient`] sends recorded audio to the provider selected by
//!   a [`crate::settings::CloudTarget`].
//!
//! Both speak the OpenAI-compatible wire format and share one client setup:
//! a per-request timeout and identifying headers on every request.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};

use crate::settings::backend::BackendError;

pub mod models;
pub mod transcribe;

#[cfg(test)]
pub(crate) mod test_server;

pub use models::{parse_model_list, ModelListClient, DEFAULT_TIMEOUT_SECS};
pub use transcribe::{encode_wav, TranscriptionClient, TRANSCRIBE_TIMEOUT_SECS};

const APP_TITLE: &str = env!("CARGO_PKG_NAME");
const APP_REFERER: &str = concat!("app://", env!("CARGO_PKG_NAME"));
const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

/// Headers sent with every provider request.
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static(APP_REFERER));
    headers.insert(USER_AGENT, HeaderValue::from_static(APP_USER_AGENT));
    headers.insert(
        HeaderName::from_static("x-title"),
        HeaderValue::from_static(APP_TITLE),
    );
    headers
}

/// HTTP client with `timeout` and the default headers.  A default
/// (no-timeout) client is used if the builder fails.
fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(default_headers())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Attach `Authorization: Bearer …` only when `api_key` is non-empty, so local
/// servers without authentication work too.
fn with_auth(req: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    if api_key.is_empty() {
        req
    } else {
        req.bearer_auth(api_key)
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim().trim_end_matches('/'))
}

/// Turn a non-success response into [`BackendError::Status`].
async fn check_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("request to {url} failed with {status}");
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}
