use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};

use crate::{
    edit::editor::{EmptyInstructionSnafu, Error},
    encode::{self, data_url, DecodeSnafu, EncodedImage},
    models::{Content, GenerateContentRequest, GenerationResponse, Part, Role},
};

/// Media type assumed when the service returns image data without one.
pub const FALLBACK_MEDIA_TYPE: &str = "image/png";

/// An image plus the instruction describing how to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    image: EncodedImage,
    instruction: String,
}

impl EditRequest {
    /// Pair an image with an instruction. The instruction is trimmed and must not be blank.
    pub fn new(image: EncodedImage, instruction: impl AsRef<str>) -> Result<Self, Error> {
        let instruction = instruction.as_ref().trim();
        ensure!(!instruction.is_empty(), EmptyInstructionSnafu);
        Ok(Self {
            image,
            instruction: instruction.to_string(),
        })
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// One user turn: the image part first, then the instruction.
    pub fn to_generate_content_request(&self) -> GenerateContentRequest {
        let content = Content::from_parts(vec![
            Part::inline_data(self.image.media_type(), self.image.data()),
            Part::text(&self.instruction),
        ])
        .with_role(Role::User);

        GenerateContentRequest {
            contents: vec![content],
        }
    }
}

/// An edited image returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    media_type: String,
    data: String,
}

impl EditResult {
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The base64 image data.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn decode(&self) -> Result<Vec<u8>, encode::Error> {
        BASE64.decode(&self.data).context(DecodeSnafu)
    }

    /// Render as `data:<media type>;base64,<data>`.
    pub fn to_data_url(&self) -> String {
        data_url(&self.media_type, &self.data)
    }
}

/// Find the first inline-data part of the first candidate.
///
/// Parts are scanned in order and the first match wins, so a text part that
/// precedes the image is skipped. Draft images marked as thoughts are skipped
/// too. Returns `None` when there are no candidates or the first candidate
/// carries no final inline data.
pub fn extract_inline_image(response: &GenerationResponse) -> Option<EditResult> {
    let parts = response.candidates.first()?.content.parts.as_ref()?;
    parts
        .iter()
        .filter(|part| !part.is_thought())
        .find_map(Part::as_inline_data)
        .map(|blob| {
            let media_type = if blob.mime_type.is_empty() {
                FALLBACK_MEDIA_TYPE
            } else {
                blob.mime_type.as_str()
            };
            EditResult::new(media_type, blob.data.clone())
        })
}
