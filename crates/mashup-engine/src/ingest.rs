use std::fs;
use std::path::{Path, PathBuf};

use mashup_contracts::assets::ImageAsset;

use crate::error::ReadError;

/// A file handed over by the picker, with the content type it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub declared_mime: String,
}

impl SelectedFile {
    /// Declares the type from the file extension; unknown extensions declare
    /// an empty type.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let declared_mime = mime_for_path(&path).unwrap_or_default().to_string();
        Self {
            path,
            declared_mime,
        }
    }

    pub fn with_declared_mime(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            declared_mime: mime.into(),
        }
    }
}

/// Reads the whole file and re-encodes it as a data URL. No size or type
/// checks are made.
pub fn ingest(file: &SelectedFile) -> Result<ImageAsset, ReadError> {
    let bytes = fs::read(&file.path).map_err(|source| ReadError::Io {
        path: file.path.clone(),
        source,
    })?;
    Ok(ImageAsset::from_bytes(&bytes, file.declared_mime.clone()))
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
