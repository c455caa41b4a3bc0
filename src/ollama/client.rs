/// Ollama HTTP client implementation.
///
/// This module provides `OllamaClient` for making synchronous HTTP requests
/// to the Ollama generate API, along with error types and a builder for
/// configuration.
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when interacting with the Ollama API.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Ollama API-specific errors
    #[error("Ollama API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Builder for constructing `OllamaClient` instances.
///
/// # Examples
///
/// ```
/// use notetaker::ollama::OllamaClientBuilder;
///
/// let client = OllamaClientBuilder::new()
///     .base_url("http://localhost:11434")
///     .model("gemma3:4b")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct OllamaClientBuilder {
    base_url: Option<String>,
    model: Option<String>,
}

impl OllamaClientBuilder {
    /// Creates a new `OllamaClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "http://localhost:11434")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model name used for generation calls.
    ///
    /// # Arguments
    ///
    /// * `model` - The model name (e.g., "gemma3:4b" or "deepseek-r1:8b")
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `OllamaClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, the `OLLAMA_HOST` environment
    /// variable is consulted, then the default `http://localhost:11434`.
    /// If `model()` was not called, `OLLAMA_MODEL` is consulted, then an
    /// empty string.
    ///
    /// # Errors
    ///
    /// Returns `OllamaError::InvalidUrl` if the base URL does not parse,
    /// or `OllamaError::Network` if the HTTP client cannot be built.
    pub fn build(self) -> Result<OllamaClient, OllamaError> {
        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string())
        };

        let model = if let Some(m) = self.model {
            m
        } else {
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| String::new())
        };

        reqwest::Url::parse(&base_url)
            .map_err(|e| OllamaError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(OllamaError::Network)?;

        Ok(OllamaClient {
            client,
            base_url,
            model,
        })
    }
}

/// Synchronous HTTP client for the Ollama generate API.
///
/// The client owns its configured model and endpoint; callers supply only
/// the prompt. Construct via `OllamaClientBuilder`.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

/// Trait for Ollama API client operations.
///
/// This trait enables mocking in unit tests and provides a clean seam
/// between the suggestion forwarder and the network.
pub trait OllamaClientTrait: Send + Sync {
    /// Generates text for the given prompt using the configured model.
    ///
    /// Returns the completion text, which may be empty when the model
    /// produced no output.
    fn generate(&self, prompt: &str) -> Result<String, OllamaError>;
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_internal(&self, prompt: &str) -> Result<String, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);
        let request_body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        retry_with_backoff(|| {
            let response = self
                .client
                .post(&url)
                .json(&request_body)
                .send()
                .map_err(classify_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(OllamaError::Http {
                    status: status.as_u16(),
                });
            }

            let json: serde_json::Value = response.json().map_err(classify_reqwest_error)?;

            // The generate endpoint returns the completion in "response"
            json.get("response")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| OllamaError::Api {
                    message: "Missing 'response' field in API response".to_string(),
                })
        })
    }
}

impl OllamaClientTrait for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String, OllamaError> {
        self.generate_internal(prompt)
    }
}

/// Maps a reqwest error to Timeout or Network.
fn classify_reqwest_error(e: reqwest::Error) -> OllamaError {
    if e.is_timeout() {
        OllamaError::Timeout(e)
    } else {
        OllamaError::Network(e)
    }
}

/// Retries an operation with exponential backoff.
///
/// Retries up to 3 times with delays of 1s, 2s, and 4s, but only on
/// transient errors (HTTP 5xx, network failures, timeouts). Client errors
/// (HTTP 4xx) and API errors surface immediately.
pub fn retry_with_backoff<F, T>(mut f: F) -> Result<T, OllamaError>
where
    F: FnMut() -> Result<T, OllamaError>,
{
    const MAX_RETRIES: usize = 3;
    const DELAYS: [u64; MAX_RETRIES] = [1, 2, 4]; // seconds

    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) => {
            if !should_retry(&e) {
                return Err(e);
            }
            e
        }
    };

    for &delay_secs in &DELAYS {
        thread::sleep(Duration::from_secs(delay_secs));

        match f() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Determines if an error should be retried.
///
/// Returns `true` for transient errors (HTTP 5xx, network errors,
/// timeouts), `false` for everything else.
fn should_retry(error: &OllamaError) -> bool {
    match error {
        OllamaError::Network(_) => true,
        OllamaError::Timeout(_) => true,
        OllamaError::Http { status } => *status >= 500 && *status < 600,
        OllamaError::Api { .. } => false,
        OllamaError::InvalidUrl(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn http_error_variant_with_status_code() {
        let error = OllamaError::Http { status: 404 };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("HTTP error"));
        assert!(error_msg.contains("404"));
    }

    #[test]
    fn api_error_variant_carries_message() {
        let error = OllamaError::Api {
            message: "Model not found".to_string(),
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Ollama API error"));
        assert!(error_msg.contains("Model not found"));
    }

    #[test]
    fn builder_new_creates_builder_with_defaults() {
        let builder = OllamaClientBuilder::new();
        assert!(builder.base_url.is_none());
        assert!(builder.model.is_none());
    }

    #[test]
    fn base_url_method_sets_custom_url() {
        let builder = OllamaClientBuilder::new().base_url("http://example.com:11434");
        assert_eq!(
            builder.base_url,
            Some("http://example.com:11434".to_string())
        );
    }

    #[test]
    #[serial]
    fn build_uses_default_url_when_base_url_not_set() {
        unsafe {
            std::env::remove_var("OLLAMA_HOST");
        }

        let client = OllamaClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    #[serial]
    fn build_reads_ollama_host_environment_variable_if_set() {
        unsafe {
            std::env::set_var("OLLAMA_HOST", "http://custom-host:11434");
        }

        let client = OllamaClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url(), "http://custom-host:11434");

        unsafe {
            std::env::remove_var("OLLAMA_HOST");
        }
    }

    #[test]
    #[serial]
    fn build_reads_ollama_model_environment_variable_if_set() {
        unsafe {
            std::env::set_var("OLLAMA_MODEL", "gemma3:4b");
        }

        let client = OllamaClientBuilder::new().build().unwrap();
        assert_eq!(client.model(), "gemma3:4b");

        unsafe {
            std::env::remove_var("OLLAMA_MODEL");
        }
    }

    #[test]
    #[serial]
    fn builder_methods_take_precedence_over_env_vars() {
        unsafe {
            std::env::set_var("OLLAMA_HOST", "http://env-var-host:11434");
            std::env::set_var("OLLAMA_MODEL", "env-model");
        }

        let client = OllamaClientBuilder::new()
            .base_url("http://builder-host:11434")
            .model("builder-model")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://builder-host:11434");
        assert_eq!(client.model(), "builder-model");

        unsafe {
            std::env::remove_var("OLLAMA_HOST");
            std::env::remove_var("OLLAMA_MODEL");
        }
    }

    #[test]
    fn build_returns_error_if_invalid_url_provided() {
        let result = OllamaClientBuilder::new()
            .base_url("not-a-valid-url")
            .build();
        assert!(matches!(result, Err(OllamaError::InvalidUrl(_))));
    }

    #[test]
    fn retry_does_not_occur_on_http_4xx_errors() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let result: Result<&str, OllamaError> = retry_with_backoff(move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            Err(OllamaError::Http { status: 404 })
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_occurs_on_http_5xx_errors() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let result: Result<&str, OllamaError> = retry_with_backoff(move || {
            let count = attempts_clone.fetch_add(1, Ordering::SeqCst);
            if count < 1 {
                Err(OllamaError::Http { status: 500 })
            } else {
                Ok("success")
            }
        });

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retry_does_not_occur_on_api_errors() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let result: Result<&str, OllamaError> = retry_with_backoff(move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            Err(OllamaError::Api {
                message: "bad request".to_string(),
            })
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_stops_after_3_attempts() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let result: Result<&str, OllamaError> = retry_with_backoff(move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            Err(OllamaError::Http { status: 503 })
        });

        assert!(result.is_err());
        // Initial attempt + 3 retries
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn trait_can_be_implemented_by_mock_struct() {
        struct MockClient {
            response: String,
        }

        impl OllamaClientTrait for MockClient {
            fn generate(&self, _prompt: &str) -> Result<String, OllamaError> {
                Ok(self.response.clone())
            }
        }

        let mock = MockClient {
            response: "test response".to_string(),
        };
        let result = mock.generate("test prompt");
        assert_eq!(result.unwrap(), "test response");
    }

    #[test]
    fn generate_request_body_shape() {
        let request_body = serde_json::json!({
            "model": "test-model",
            "prompt": "test prompt",
            "stream": false
        });

        assert_eq!(request_body["model"], "test-model");
        assert_eq!(request_body["prompt"], "test prompt");
        assert_eq!(request_body["stream"], false);
    }

    #[test]
    fn generate_response_field_extraction() {
        let response_json = serde_json::json!({
            "response": "Generated text here"
        });

        let response_text = response_json
            .get("response")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap();

        assert_eq!(response_text, "Generated text here");
    }
}
