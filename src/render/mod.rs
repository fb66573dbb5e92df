use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

/// Formats accepted as photo content, matching the picker's extension filter.
pub const SUPPORTED_FORMATS: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image stream is empty: {locator}")]
    Empty { locator: String },
    #[error("not a recognized image stream: {locator}")]
    UnknownFormat { locator: String },
    #[error("unsupported image format {format:?}: {locator}")]
    UnsupportedFormat {
        locator: String,
        format: ImageFormat,
    },
    #[error("failed to decode image {locator}: {source}")]
    Malformed {
        locator: String,
        #[source]
        source: image::ImageError,
    },
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Decoded bitmap ready to be shown by the page. Never persisted.
#[derive(Debug, Clone)]
pub struct RenderableImage {
    locator: String,
    format: ImageFormat,
    bitmap: DynamicImage,
}

impl RenderableImage {
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }

    pub fn bitmap(&self) -> &DynamicImage {
        &self.bitmap
    }
}

pub fn decode_image(locator: &str, bytes: &[u8]) -> DecodeResult<RenderableImage> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty {
            locator: locator.to_string(),
        });
    }

    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnknownFormat {
        locator: locator.to_string(),
    })?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(DecodeError::UnsupportedFormat {
            locator: locator.to_string(),
            format,
        });
    }

    let bitmap = image::load_from_memory_with_format(bytes, format).map_err(|source| {
        DecodeError::Malformed {
            locator: locator.to_string(),
            source,
        }
    })?;
    tracing::debug!(
        locator,
        ?format,
        width = bitmap.width(),
        height = bitmap.height(),
        "decoded image"
    );

    Ok(RenderableImage {
        locator: locator.to_string(),
        format,
        bitmap,
    })
}
