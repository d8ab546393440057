//! Image payload policy.
//!
//! Oversized or unrecognized image frames are dropped silently (local log
//! only, no error frame back to the sender).

/// Maximum accepted length of the base64-encoded payload, in bytes.
pub const MAX_ENCODED_LEN: usize = 5 * 1024 * 1024;

/// MIME types accepted for image payloads.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Why an image frame was rejected. Surfaces only in the local log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageRejection {
    /// Encoded payload exceeds [`MAX_ENCODED_LEN`].
    #[error("image payload too large: {0} bytes encoded")]
    TooLarge(usize),
    /// MIME type is not in [`ALLOWED_IMAGE_TYPES`].
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
}

/// Checks an image payload against the size cap and MIME allow-list.
///
/// # Errors
///
/// Returns an [`ImageRejection`] describing the violated policy.
pub fn validate(image: &str, image_type: &str) -> Result<(), ImageRejection> {
    if image.len() > MAX_ENCODED_LEN {
        return Err(ImageRejection::TooLarge(image.len()));
    }
    if !ALLOWED_IMAGE_TYPES.contains(&image_type) {
        return Err(ImageRejection::UnsupportedType(image_type.to_string()));
    }
    Ok(())
}
