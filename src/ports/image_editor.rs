//! Image editor port for generative image-editing APIs.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// MIME type assumed for a data URL or bare base64 that declares none.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// An image held in memory: raw bytes plus their declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Raw image bytes (decoded from base64).
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type of the image (e.g., `"image/jpeg"`).
    pub mime_type: String,
}

impl ImagePayload {
    /// Wrap bytes with an explicit MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data, mime_type: mime_type.into() }
    }

    /// Read an image file. The MIME type comes from the content, then the
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if neither its content
    /// nor its extension identifies a raster format.
    pub fn from_path(path: &Path) -> Result<Self, EditError> {
        let data = std::fs::read(path)?;
        let mime_type = sniff_mime(&data)
            .or_else(|| image::ImageFormat::from_path(path).ok().map(|f| f.to_mime_type()))
            .ok_or_else(|| {
                EditError::InvalidArgument(format!(
                    "Not a valid image: {} (expected PNG, JPEG, WebP or another raster format)",
                    path.display()
                ))
            })?;
        Ok(Self::new(data, mime_type))
    }

    /// Load from a CLI argument: a `data:` URL or a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the URL is malformed.
    pub fn load(source: &str) -> Result<Self, EditError> {
        if source.starts_with("data:") {
            Self::from_data_url(source)
        } else {
            Self::from_path(Path::new(source))
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    ///
    /// A bare base64 string without the `data:` header is accepted and tagged
    /// with [`DEFAULT_MIME_TYPE`].
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid base64.
    pub fn from_data_url(url: &str) -> Result<Self, EditError> {
        let (header, encoded) = match url.split_once(',') {
            Some((header, encoded)) => (Some(header), encoded),
            None => (None, url),
        };
        let mime_type = header
            .and_then(|h| h.strip_prefix("data:"))
            .and_then(|h| h.split(';').next())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| EditError::InvalidArgument(format!("Invalid base64 image data: {e}")))?;
        Ok(Self::new(data, mime_type))
    }

    /// Render as a `data:<mime>;base64,<payload>` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Base64 encoding of the raw bytes, as sent inline to the APIs.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Non-empty bytes declared as some `image/*` type.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.mime_type.starts_with("image/")
    }
}

fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    image::guess_format(data).ok().map(|f| f.to_mime_type())
}

/// A single edit request: one source image and one user instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    /// The image to edit.
    pub image: ImagePayload,
    /// The user's instruction, verbatim.
    pub instruction: String,
}

impl EditRequest {
    /// The full natural-language directive sent alongside the image.
    #[must_use]
    pub fn directive(&self) -> String {
        build_directive(&self.instruction)
    }
}

/// Restate the user instruction with the fixed product-photo quality guidance.
#[must_use]
pub fn build_directive(instruction: &str) -> String {
    format!(
        "Follow these editing instructions precisely for this product photo: {}. \
         If background removal is requested, ensure clean edges. \
         If cleanup is requested, remove blemishes and shadows while preserving detail. \
         Return the edited image.",
        instruction.trim()
    )
}

/// Boxed future type returned by [`ImageEditor::edit`].
pub type EditFuture<'a> = Pin<Box<dyn Future<Output = Result<ImagePayload, EditError>> + Send + 'a>>;

/// Edits images according to a text instruction via an external API.
pub trait ImageEditor: Send + Sync {
    /// Perform one edit. Resolves to the first image the service returned.
    fn edit(&self, request: &EditRequest) -> EditFuture<'_>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings in cassettes.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as base64 string.
    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    /// Deserialize base64 string to bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
