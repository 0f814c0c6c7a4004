use std::path::Path;

use crate::error::ApiError;

/// Images and clips a listing may carry in total
pub const MAX_LISTING_IMAGES: usize = 10;
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_CONTENT_TYPES: [&str; 5] =
    ["image/jpeg", "image/png", "image/webp", "video/mp4", "video/webm"];

/// A file queued for upload to a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reads a file from disk, guessing its content type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidUpload(format!("{} has no file name", path.display())))?
            .to_string();
        let content_type = content_type_for(&file_name).ok_or_else(|| {
            ApiError::InvalidUpload(format!("{}: unsupported file type", file_name))
        })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::InvalidUpload(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}

/// Checks the backend's upload limits before sending anything
pub fn validate_uploads(existing: usize, files: &[ImageUpload]) -> Result<(), ApiError> {
    if files.is_empty() {
        return Err(ApiError::InvalidUpload("no files selected".to_string()));
    }
    if existing + files.len() > MAX_LISTING_IMAGES {
        return Err(ApiError::InvalidUpload(format!(
            "maximum {} files allowed per listing ({} already attached)",
            MAX_LISTING_IMAGES, existing
        )));
    }
    for file in files {
        if !ALLOWED_CONTENT_TYPES.contains(&file.content_type.as_str()) {
            return Err(ApiError::InvalidUpload(format!(
                "file type {} not allowed",
                file.content_type
            )));
        }
        if file.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::InvalidUpload(format!(
                "{} is too large (max 10MB)",
                file.file_name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(name: &str, size: usize) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn eleventh_image_is_refused() {
        assert!(validate_uploads(9, &[jpeg("a.jpg", 10)]).is_ok());
        assert!(matches!(
            validate_uploads(10, &[jpeg("b.jpg", 10)]),
            Err(ApiError::InvalidUpload(_))
        ));
    }

    #[test]
    fn oversized_or_foreign_files_are_refused() {
        assert!(validate_uploads(0, &[jpeg("big.jpg", MAX_UPLOAD_BYTES + 1)]).is_err());

        let gif = ImageUpload {
            content_type: "image/gif".into(),
            ..jpeg("anim.gif", 10)
        };
        assert!(validate_uploads(0, &[gif]).is_err());
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("salon.JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for("visite.webm"), Some("video/webm"));
        assert_eq!(content_type_for("plan.pdf"), None);
        assert_eq!(content_type_for("noext"), None);
    }
}
