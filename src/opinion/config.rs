//! Credential and model resolution for opinion backends.
//!
//! Resolution order for both values: explicit argument → environment
//! variable → default (models only; a missing API key is an error).
//! Blank values count as unset.

use crate::error::{Error, Result};
use crate::model::Backend;
use std::time::Duration;

/// Timeout applied to every backend request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve the API key for `backend` from the process environment.
///
/// # Errors
///
/// Returns `MissingCredential` when neither source provides a key.
pub fn resolve_api_key(backend: Backend, explicit: Option<&str>) -> Result<String> {
    resolve_api_key_with(backend, explicit, |key| std::env::var(key).ok())
}

/// [`resolve_api_key`] with an injectable environment lookup.
///
/// # Errors
///
/// Returns `MissingCredential` when neither source provides a key.
pub fn resolve_api_key_with<F>(backend: Backend, explicit: Option<&str>, env: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(explicit.map(ToString::to_string))
        .or_else(|| non_blank(env(backend.api_key_env())))
        .ok_or(Error::MissingCredential {
            backend,
            env_var: backend.api_key_env(),
        })
}

/// Resolve the model for `backend` from the process environment.
#[must_use]
pub fn resolve_model(backend: Backend, explicit: Option<&str>) -> String {
    resolve_model_with(backend, explicit, |key| std::env::var(key).ok())
}

/// [`resolve_model`] with an injectable environment lookup.
pub fn resolve_model_with<F>(backend: Backend, explicit: Option<&str>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(explicit.map(ToString::to_string))
        .or_else(|| non_blank(env(backend.model_env())))
        .unwrap_or_else(|| backend.default_model().to_string())
}

/// Build the HTTP client shared by a backend instance.
///
/// # Errors
///
/// Returns a `Config` error if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))
}

/// Map a transport failure to the backend error taxonomy.
pub(crate) fn request_error(backend: Backend, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::BackendTimeout {
            backend,
            seconds: REQUEST_TIMEOUT.as_secs(),
        }
    } else {
        Error::Backend {
            backend,
            message: err.to_string(),
        }
    }
}

/// Turn a non-success HTTP response into a backend error.
pub(crate) async fn ensure_success(
    backend: Backend,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Backend {
        backend,
        message: format!("API error ({status}): {body}"),
    })
}
