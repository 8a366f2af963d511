//! Second opinions from LLM backends.
//!
//! Each vendor family implements [`OpinionBackend`]. Callers that pick the
//! backend at runtime use [`BoxedBackend`], built by [`create_backend`].
//!
//! # Submodules
//!
//! - [`prompt`] - Context rendering and system prompts
//! - [`config`] - API key / model resolution, HTTP client
//! - [`openai`] - ChatGPT and DeepSeek (OpenAI-compatible chat completions)
//! - [`anthropic`] - Claude (Messages API)
//! - [`gemini`] - Gemini (`generateContent`)

pub mod anthropic;
pub mod config;
pub mod gemini;
pub mod openai;
pub mod prompt;

pub use anthropic::ClaudeBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

use crate::error::Result;
use crate::model::{Backend, ContextEntry};
use std::future::Future;
use std::pin::Pin;

/// An LLM service that reviews a context entry.
///
/// Requests are single-shot: failures and timeouts are returned to the
/// caller, never retried internally.
pub trait OpinionBackend: Send + Sync {
    /// Which backend this is (selects the response column).
    fn backend(&self) -> Backend;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Ask for a review of `entry`, or an answer to `question` about it.
    fn get_opinion(
        &self,
        entry: &ContextEntry,
        question: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Boxed backend for dynamic dispatch.
///
/// Since the trait has async methods with `impl Future`, we need this wrapper
/// for runtime polymorphism.
pub struct BoxedBackend {
    inner: Box<dyn OpinionBackendBoxed>,
}

/// Object-safe version of [`OpinionBackend`] for boxing.
trait OpinionBackendBoxed: Send + Sync {
    fn backend(&self) -> Backend;
    fn model(&self) -> &str;
    fn get_opinion_boxed<'a>(
        &'a self,
        entry: &'a ContextEntry,
        question: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

impl BoxedBackend {
    /// Create a new boxed backend.
    pub fn new<B: OpinionBackend + 'static>(backend: B) -> Self {
        Self {
            inner: Box::new(BoxedBackendWrapper(backend)),
        }
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.inner.backend()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.inner.model()
    }

    /// See [`OpinionBackend::get_opinion`].
    ///
    /// # Errors
    ///
    /// Returns `Backend` or `BackendTimeout` errors from the vendor call.
    pub async fn get_opinion(&self, entry: &ContextEntry, question: Option<&str>) -> Result<String> {
        self.inner.get_opinion_boxed(entry, question).await
    }
}

impl std::fmt::Debug for BoxedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedBackend")
            .field("backend", &self.backend())
            .field("model", &self.model())
            .finish()
    }
}

/// Wrapper to implement `OpinionBackendBoxed` for any `OpinionBackend`.
struct BoxedBackendWrapper<B: OpinionBackend + 'static>(B);

impl<B: OpinionBackend + 'static> OpinionBackendBoxed for BoxedBackendWrapper<B> {
    fn backend(&self) -> Backend {
        self.0.backend()
    }

    fn model(&self) -> &str {
        self.0.model()
    }

    fn get_opinion_boxed<'a>(
        &'a self,
        entry: &'a ContextEntry,
        question: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.0.get_opinion(entry, question))
    }
}

/// Create the backend for `backend`, resolving credentials and model.
///
/// `api_key` and `model` override the environment when given.
///
/// # Errors
///
/// Returns `MissingCredential` if no API key is available, or `Config` if
/// the HTTP client cannot be built.
pub fn create_backend(
    backend: Backend,
    api_key: Option<&str>,
    model: Option<&str>,
) -> Result<BoxedBackend> {
    let api_key = config::resolve_api_key(backend, api_key)?;
    let model = config::resolve_model(backend, model);

    Ok(match backend {
        Backend::ChatGpt | Backend::DeepSeek => {
            BoxedBackend::new(OpenAiBackend::new(backend, api_key, model)?)
        }
        Backend::Claude => BoxedBackend::new(ClaudeBackend::new(api_key, model)?),
        Backend::Gemini => BoxedBackend::new(GeminiBackend::new(api_key, model)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContextContent;

    struct EchoBackend;

    impl OpinionBackend for EchoBackend {
        fn backend(&self) -> Backend {
            Backend::Claude
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn get_opinion(&self, entry: &ContextEntry, question: Option<&str>) -> Result<String> {
            Ok(format!("{}|{}", entry.title, question.unwrap_or("-")))
        }
    }

    #[test]
    fn test_boxed_backend_delegates() {
        let boxed = BoxedBackend::new(EchoBackend);
        assert_eq!(boxed.backend(), Backend::Claude);
        assert_eq!(boxed.model(), "echo-1");

        let entry = ContextEntry::new("code", "Title", ContextContent::default(), "/p");
        let rt = tokio::runtime::Runtime::new().unwrap();
        let answer = rt.block_on(boxed.get_opinion(&entry, Some("why"))).unwrap();
        assert_eq!(answer, "Title|why");
    }

    #[test]
    fn test_create_backend_with_explicit_key() {
        for backend in Backend::ALL {
            let boxed = create_backend(backend, Some("key"), Some("custom-model")).unwrap();
            assert_eq!(boxed.backend(), backend);
            assert_eq!(boxed.model(), "custom-model");
        }
    }
}
