//! Multipart image uploads.

use axum::extract::Multipart;

use crate::error::AppError;

/// Largest accepted image upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// An image read from a multipart body.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
}

/// Map an image MIME type to its canonical name and file extension.
fn image_kind(content_type: &str) -> Option<(&'static str, &'static str)> {
    match content_type.split(';').next().map(str::trim) {
        Some("image/jpeg" | "image/jpg") => Some(("image/jpeg", "jpg")),
        Some("image/png") => Some(("image/png", "png")),
        Some("image/webp") => Some(("image/webp", "webp")),
        _ => None,
    }
}

/// Identify an image by its leading bytes.
fn sniff(bytes: &[u8]) -> Option<(&'static str, &'static str)> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(("image/png", "png"))
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some(("image/jpeg", "jpg"))
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(&b"WEBP"[..]) {
        Some(("image/webp", "webp"))
    } else {
        None
    }
}

/// Read the `file` field as an image.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when the field is missing, not a JPEG, PNG
/// or WebP image, empty, or larger than [`MAX_UPLOAD_BYTES`]. The declared
/// content type must match the file's signature.
pub async fn read_image(multipart: &mut Multipart) -> Result<ImageUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let (content_type, extension) = field
            .content_type()
            .and_then(image_kind)
            .ok_or_else(|| {
                AppError::BadRequest("file must be a JPEG, PNG or WebP image".to_string())
            })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("file is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest(format!(
                "file exceeds {MAX_UPLOAD_BYTES} bytes"
            )));
        }
        if sniff(&bytes) != Some((content_type, extension)) {
            return Err(AppError::BadRequest(format!(
                "file content is not a valid {content_type} image"
            )));
        }
        return Ok(ImageUpload {
            bytes: bytes.to_vec(),
            content_type,
            extension,
        });
    }
    Err(AppError::BadRequest("missing file field".to_string()))
}
