use image::{ImageError, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

/// Why a metadata strip was abandoned.
///
/// This is deliberately separate from [`crate::errors::Error`]: a failed strip
/// is logged and the downloaded file is kept as fetched.
#[derive(Error, Debug)]
pub enum StripError {
    /// The downloaded bytes are not a decodable image.
    #[error("image is corrupt before stripping: {0}")]
    CorruptInput(#[source] ImageError),

    /// The image decoded but could not be written back in its own format.
    #[error("image could not be re-encoded: {0}")]
    Encode(#[source] ImageError),

    /// The stripped output no longer decodes.
    #[error("image is corrupt after stripping: {0}")]
    CorruptOutput(#[source] ImageError),
}

/// Removes embedded metadata (EXIF, text chunks, ICC profiles) from an image.
pub trait MetadataStripper {
    fn strip(&self, bytes: &[u8]) -> Result<Vec<u8>, StripError>;
}

/// Strips metadata by decoding the pixels and re-encoding them in the
/// original format. Encoders only emit pixel data, so ancillary metadata
/// is dropped. Both the input and the output are validated by decoding.
#[derive(Default)]
pub struct ImageMetadataStripper;

impl MetadataStripper for ImageMetadataStripper {
    fn strip(&self, bytes: &[u8]) -> Result<Vec<u8>, StripError> {
        let format = image::guess_format(bytes).map_err(StripError::CorruptInput)?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(StripError::CorruptInput)?;

        let mut stripped = Cursor::new(Vec::with_capacity(bytes.len()));
        decoded
            .write_to(&mut stripped, format)
            .map_err(StripError::Encode)?;
        let stripped = stripped.into_inner();

        validate(&stripped, format).map_err(StripError::CorruptOutput)?;
        Ok(stripped)
    }
}

fn validate(bytes: &[u8], format: ImageFormat) -> Result<(), ImageError> {
    image::load_from_memory_with_format(bytes, format).map(|_| ())
}
