//! Turning a local image into a transport-ready payload.
//!
//! An [`EncodedImage`] is the base64 text of a file plus the media type the file
//! was declared with. Nothing checks that the bytes really are an image; the
//! remote service is the one that rejects garbage.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, Snafu};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to read image file '{}'", path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("not a base64 data URL (expected 'data:<media type>;base64,<data>')"))]
    MalformedDataUrl,

    #[snafu(display("image payload is not valid base64"))]
    Decode { source: base64::DecodeError },
}

/// Base64 image data paired with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    data: String,
    media_type: String,
}

impl EncodedImage {
    /// Encode raw bytes.
    pub fn from_bytes(bytes: impl AsRef<[u8]>, media_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            media_type: media_type.into(),
        }
    }

    /// Wrap data that is already base64 encoded.
    pub fn from_base64(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    /// Read and encode a file, taking the media type from its extension.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .context(ReadFileSnafu { path })?;
        let media_type = mime_guess::from_path(path).first_or_octet_stream();
        debug!(file.size = bytes.len(), media.type = %media_type, "image file read");
        Ok(Self::from_bytes(bytes, media_type.essence_str()))
    }

    /// Accept a `data:<media type>;base64,<data>` URL and strip its prefix.
    pub fn from_data_url(url: &str) -> Result<Self, Error> {
        let rest = url.strip_prefix("data:").context(MalformedDataUrlSnafu)?;
        let (header, data) = rest.split_once(',').context(MalformedDataUrlSnafu)?;
        let media_type = header
            .strip_suffix(";base64")
            .context(MalformedDataUrlSnafu)?;
        let media_type = match media_type {
            "" => mime::APPLICATION_OCTET_STREAM.to_string(),
            declared => declared.to_string(),
        };
        Ok(Self::from_base64(data, media_type))
    }

    /// The base64 payload, without any `data:` prefix.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Decode the payload back to bytes.
    pub fn decode(&self) -> Result<Vec<u8>, Error> {
        BASE64.decode(&self.data).context(DecodeSnafu)
    }

    /// Render as a `data:` URL suitable for display.
    pub fn to_data_url(&self) -> String {
        data_url(&self.media_type, &self.data)
    }
}

pub(crate) fn data_url(media_type: &str, data: &str) -> String {
    format!("data:{media_type};base64,{data}")
}
