use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client, Response};
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

use crate::models::{GenerateContentRequest, GenerationResponse};

pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// The image model edits are sent to.
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash-image";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to parse API key"))]
    InvalidApiKey { source: reqwest::header::InvalidHeaderValue },

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("failed to read response body"))]
    ReadBody { source: reqwest::Error },

    #[snafu(display("failed to deserialize JSON response"))]
    Deserialize { source: serde_json::Error },
}

impl Error {
    /// The most specific message behind this failure, if any.
    ///
    /// A non-2xx reply yields the service's own description. Every other
    /// variant yields the innermost cause in its source chain, such as the
    /// operating system's "Connection refused".
    pub fn service_message(&self) -> Option<String> {
        match self {
            Error::BadResponse { description, .. } => description.clone(),
            _ => {
                let mut cause = std::error::Error::source(self)?;
                while let Some(next) = cause.source() {
                    cause = next;
                }
                Some(cause.to_string())
            }
        }
    }
}

/// Something that can run a `generateContent` call.
///
/// [`GeminiClient`] talks HTTP; tests substitute an in-memory fake.
#[async_trait]
pub trait GenerateContent: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerationResponse, Error>;
}

#[async_trait]
impl<T: GenerateContent + ?Sized> GenerateContent for Arc<T> {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        (**self).generate_content(api_key, model, request).await
    }
}

/// HTTP client for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: Client,
    base_url: Url,
}

impl GeminiClient {
    /// Create a client against the public endpoint
    pub fn new() -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context(ConstructUrlSnafu {
            suffix: DEFAULT_BASE_URL,
        })?;
        Ok(Self::with_base_url(base_url))
    }

    /// Create a client with a custom base URL
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the `generateContent` URL for a model
    fn build_url(&self, model: &str) -> Result<Url, Error> {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        let suffix = format!("{model}:generateContent");
        let url_str = format!("{}{}", self.base_url, suffix);
        Url::parse(&url_str).context(ConstructUrlSnafu { suffix })
    }

    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok().map(|t| error_message(&t));
            BadResponseSnafu {
                code: status.as_u16(),
                description,
            }
            .fail()
        } else {
            Ok(response)
        }
    }
}

/// Error envelope returned by Google APIs
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull `error.message` out of an error body, keeping the raw text otherwise.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl GenerateContent for GeminiClient {
    #[instrument(skip_all, fields(
        model = %model,
        contents.count = request.contents.len(),
    ))]
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url(model)?;
        let mut key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        key.set_sensitive(true);

        let response = self
            .http_client
            .post(url.clone())
            .header("x-goog-api-key", key)
            .json(request)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;
        let response = Self::check_response(response).await?;

        let bytes = response.bytes().await.context(ReadBodySnafu)?;
        debug!(response.size = bytes.len(), "generateContent response received");
        serde_json::from_slice(&bytes).context(DeserializeSnafu)
    }
}
