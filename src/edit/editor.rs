use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, instrument, warn};

use crate::{
    client::{Error as ClientError, GeminiClient, GenerateContent, DEFAULT_MODEL},
    config::Config,
    edit::model::{extract_inline_image, EditRequest, EditResult},
    encode::EncodedImage,
};

/// Shown when the service failed without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate image. Please try again.";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("API Key is missing. Please check your environment configuration."))]
    Configuration,

    #[snafu(display("edit instruction is empty"))]
    EmptyInstruction,

    #[snafu(display("image edit request failed"))]
    Remote { source: ClientError },

    #[snafu(display("No image data returned from the model."))]
    EmptyResult {
        /// Why the prompt was blocked, when the service said so
        block_reason: Option<String>,
    },
}

impl Error {
    /// The inline message a user sees for this failure.
    ///
    /// A remote failure shows the most specific message behind it and falls
    /// back to [`GENERIC_FAILURE_MESSAGE`] only when there is none.
    pub fn user_message(&self) -> String {
        match self {
            Error::Remote { source } => source
                .service_message()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            other => other.to_string(),
        }
    }
}

/// Sends image edits to the model through an injected transport.
///
/// # Example
///
/// ```no_run
/// use agrivision::prelude::*;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = EditClient::new(GeminiClient::new()?, std::env::var("API_KEY").ok());
/// let image = EncodedImage::from_path("field.jpg").await?;
/// let result = client
///     .edit(&image, "Add a rustic wooden fence around the crop")
///     .await?;
/// println!("{}", result.to_data_url());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EditClient<T = GeminiClient> {
    transport: T,
    api_key: Option<String>,
    model: String,
}

impl EditClient<GeminiClient> {
    /// Build an HTTP-backed client from configuration.
    pub fn from_config(config: &Config) -> Self {
        EditClient::new(
            GeminiClient::with_base_url(config.base_url.clone()),
            config.api_key.clone(),
        )
        .with_model(config.model.clone())
    }
}

impl<T: GenerateContent> EditClient<T> {
    /// Create a client. A `None` or empty key makes every edit fail with
    /// [`Error::Configuration`] without touching the network.
    pub fn new(transport: T, api_key: Option<String>) -> Self {
        Self {
            transport,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Send edits to a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Edit `image` as `instruction` describes.
    pub async fn edit(&self, image: &EncodedImage, instruction: &str) -> Result<EditResult, Error> {
        self.api_key()?;
        let request = EditRequest::new(image.clone(), instruction)?;
        self.send(&request).await
    }

    /// Send an already validated request.
    #[instrument(skip_all, fields(
        model = %self.model,
        image.media_type = request.image().media_type(),
        image.encoded_size = request.image().data().len(),
        instruction.len = request.instruction().len(),
    ))]
    pub async fn send(&self, request: &EditRequest) -> Result<EditResult, Error> {
        let api_key = self.api_key()?;

        let response = self
            .transport
            .generate_content(api_key, &self.model, &request.to_generate_content_request())
            .await
            .context(RemoteSnafu)?;

        match extract_inline_image(&response) {
            Some(result) => {
                debug!(
                    result.media_type = result.media_type(),
                    result.encoded_size = result.data().len(),
                    "edited image received"
                );
                Ok(result)
            }
            None => {
                let block_reason = response.block_reason().map(str::to_string);
                warn!(
                    candidates = response.candidates.len(),
                    block_reason = block_reason.as_deref(),
                    text = %response.text(),
                    "response carried no image data"
                );
                EmptyResultSnafu { block_reason }.fail()
            }
        }
    }

    fn api_key(&self) -> Result<&str, Error> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .context(ConfigurationSnafu)
    }
}
