use std::path::Path;

use validator::Validate;

use crate::error::{Error, Result};

pub fn validate<T: Validate>(val: &T) -> std::result::Result<(), validator::ValidationErrors> {
    val.validate()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    pub fn max_bytes(self) -> usize {
        match self {
            UploadKind::Image => 5 * 1024 * 1024,
            UploadKind::Document => 10 * 1024 * 1024,
        }
    }

    fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => &["jpg", "jpeg", "png", "webp", "gif"],
            UploadKind::Document => &["pdf", "doc", "docx"],
        }
    }
}

/// A file that passed validation and may be sent or stored.
#[derive(Debug, Clone)]
pub struct CheckedUpload {
    pub file_name: String,
    pub extension: String,
    pub content_type: String,
    pub data: bytes::Bytes,
}

/// Checks type and size before anything touches the network or disk.
pub fn check_upload(kind: UploadKind, file_name: &str, data: bytes::Bytes) -> Result<CheckedUpload> {
    if data.is_empty() {
        return Err(Error::BadRequest(format!("{} is empty", file_name)));
    }
    if data.len() > kind.max_bytes() {
        return Err(Error::BadRequest(format!(
            "{} exceeds the {} MB limit",
            file_name,
            kind.max_bytes() / (1024 * 1024)
        )));
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !kind.allowed_extensions().contains(&extension.as_str()) {
        return Err(Error::BadRequest(format!(
            "File type .{} is not allowed",
            extension
        )));
    }

    if extension == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    if (extension == "jpg" || extension == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::BadRequest("Invalid JPEG file content".into()));
    }
    if extension == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Err(Error::BadRequest("Invalid PNG file content".into()));
    }

    let content_type = mime_guess::from_ext(&extension)
        .first_or_octet_stream()
        .to_string();

    Ok(CheckedUpload {
        file_name: file_name.to_string(),
        extension,
        content_type,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_real_pdf() {
        let upload = check_upload(
            UploadKind::Document,
            "CV.PDF",
            bytes::Bytes::from_static(b"%PDF-1.7 body"),
        )
        .unwrap();
        assert_eq!(upload.extension, "pdf");
        assert_eq!(upload.content_type, "application/pdf");
    }

    #[test]
    fn rejects_disguised_pdf() {
        let err = check_upload(
            UploadKind::Document,
            "cv.pdf",
            bytes::Bytes::from_static(b"MZ executable"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid PDF"));
    }

    #[test]
    fn rejects_wrong_kind() {
        assert!(check_upload(
            UploadKind::Image,
            "cv.pdf",
            bytes::Bytes::from_static(b"%PDF-1.7")
        )
        .is_err());
    }

    #[test]
    fn rejects_oversized_image() {
        let big = vec![0x89u8; UploadKind::Image.max_bytes() + 1];
        let err = check_upload(UploadKind::Image, "hero.png", bytes::Bytes::from(big)).unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }
}
