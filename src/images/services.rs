use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;

use crate::errors::CoreError;

/// A meal photo as received from the client.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

impl UploadItem {
    /// Checks the photo is non-empty and of a type the vision model accepts.
    pub fn validated(body: Bytes, content_type: &str) -> Result<Self, CoreError> {
        if body.is_empty() {
            return Err(CoreError::invalid("image is empty"));
        }
        let mime = normalize_mime(content_type).ok_or_else(|| {
            CoreError::invalid(format!("unsupported image type {content_type:?}"))
        })?;
        Ok(Self {
            body,
            content_type: mime.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            general_purpose::STANDARD.encode(&self.body)
        )
    }
}

fn normalize_mime(ct: &str) -> Option<&'static str> {
    let base = ct.split(';').next().unwrap_or_default().trim();
    match base.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        "image/webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime("image/jpeg"), Some("image/jpeg"));
        assert_eq!(normalize_mime("image/jpg"), Some("image/jpeg"));
        assert_eq!(normalize_mime("IMAGE/PNG"), Some("image/png"));
        assert_eq!(normalize_mime("image/webp; q=1"), Some("image/webp"));
        assert_eq!(normalize_mime("image/heic"), None);
        assert_eq!(normalize_mime("application/octet-stream"), None);
    }

    #[test]
    fn rejects_empty_and_unknown() {
        assert!(UploadItem::validated(Bytes::new(), "image/png").is_err());
        assert!(UploadItem::validated(Bytes::from_static(b"x"), "text/plain").is_err());
    }

    #[test]
    fn data_url_is_base64() {
        let item = UploadItem::validated(Bytes::from_static(b"abc"), "image/png").unwrap();
        assert_eq!(item.to_data_url(), "data:image/png;base64,YWJj");
    }
}
