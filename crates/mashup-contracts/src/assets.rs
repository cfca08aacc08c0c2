use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

/// File name offered by the download affordance.
pub const DOWNLOAD_FILE_NAME: &str = "character-product-mashup.png";

const DEFAULT_RESULT_MIME: &str = "image/png";

/// The two logical upload roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRole {
    Character,
    Product,
}

impl SlotRole {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotRole::Character => "character",
            SlotRole::Product => "product",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SlotRole::Character => "Character Image",
            SlotRole::Product => "Product Image",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "character" | "char" => Some(SlotRole::Character),
            "product" | "prod" => Some(SlotRole::Product),
            _ => None,
        }
    }
}

impl std::fmt::Display for SlotRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ingested image held in memory.
///
/// `base64` is always the payload segment of `data_url`, and `mime_type` is
/// the type the file was declared with when it was picked. The fields are
/// private so an asset cannot drift out of that shape after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data_url: String,
    base64: String,
    mime_type: String,
}

impl ImageAsset {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let data_url = encode_data_url(&mime_type, bytes);
        let base64 = split_data_url(&data_url)
            .map(|(_, payload)| payload.to_string())
            .unwrap_or_default();
        Self {
            data_url,
            base64,
            mime_type,
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.base64.as_bytes())
            .context("image asset payload is not valid base64")
    }

    /// Size of the original file, computed from the payload length.
    pub fn byte_len(&self) -> usize {
        let padding = self
            .base64
            .bytes()
            .rev()
            .take_while(|byte| *byte == b'=')
            .count();
        ((self.base64.len() / 4) * 3).saturating_sub(padding.min(2))
    }
}

/// The composite image returned by a generation call, as a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    data_url: String,
}

impl GenerationResult {
    /// Wraps an inline image payload as returned by the service.
    pub fn from_inline(mime_type: Option<&str>, base64_payload: &str) -> Self {
        let mime = mime_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_RESULT_MIME);
        Self {
            data_url: format!("data:{mime};base64,{}", base64_payload.trim()),
        }
    }

    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            data_url: encode_data_url(mime_type, bytes),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn mime_type(&self) -> &str {
        split_data_url(&self.data_url)
            .map(|(mime, _)| mime)
            .unwrap_or(DEFAULT_RESULT_MIME)
    }

    pub fn base64(&self) -> &str {
        split_data_url(&self.data_url)
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.base64().as_bytes())
            .context("generated image payload is not valid base64")
    }
}

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

/// Splits `data:<mime>;base64,<payload>` into its MIME type and payload.
pub fn split_data_url(data_url: &str) -> Result<(&str, &str)> {
    let Some(rest) = data_url.strip_prefix("data:") else {
        bail!("not a data URI");
    };
    let Some((header, payload)) = rest.split_once(',') else {
        bail!("data URI has no payload delimiter");
    };
    let Some(mime) = header.strip_suffix(";base64") else {
        bail!("data URI is not base64 encoded");
    };
    if payload.is_empty() {
        bail!("data URI payload is empty");
    }
    Ok((mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_payload_is_the_data_url_tail() -> Result<()> {
        let bytes = b"\x89PNG\r\n\x1a\nfake-png-body";
        let asset = ImageAsset::from_bytes(bytes, "image/png");

        assert!(asset.data_url().starts_with("data:image/png;base64,"));
        let (_, payload) = split_data_url(asset.data_url())?;
        assert_eq!(payload, asset.base64());
        assert_eq!(asset.decode()?, bytes.to_vec());
        assert_eq!(asset.byte_len(), bytes.len());
        Ok(())
    }

    #[test]
    fn asset_keeps_empty_declared_type() {
        let asset = ImageAsset::from_bytes(b"abc", "");
        assert_eq!(asset.mime_type(), "");
        assert_eq!(asset.data_url(), "data:;base64,YWJj");
        assert_eq!(asset.base64(), "YWJj");
    }

    #[test]
    fn byte_len_accounts_for_padding() {
        for len in 0..8usize {
            let bytes = vec![7u8; len];
            let asset = ImageAsset::from_bytes(&bytes, "image/gif");
            assert_eq!(asset.byte_len(), len, "len {len}");
        }
    }

    #[test]
    fn result_defaults_to_png_when_mime_missing() -> Result<()> {
        let result = GenerationResult::from_inline(None, "aGVsbG8=");
        assert_eq!(result.data_url(), "data:image/png;base64,aGVsbG8=");
        assert_eq!(result.mime_type(), "image/png");
        assert_eq!(result.decode()?, b"hello".to_vec());

        let jpeg = GenerationResult::from_inline(Some(" image/jpeg "), "aGVsbG8=");
        assert_eq!(jpeg.mime_type(), "image/jpeg");
        Ok(())
    }

    #[test]
    fn split_rejects_malformed_data_urls() {
        assert!(split_data_url("https://example.test/a.png").is_err());
        assert!(split_data_url("data:image/png;base64").is_err());
        assert!(split_data_url("data:image/png,abc").is_err());
        assert!(split_data_url("data:image/png;base64,").is_err());
        assert_eq!(
            split_data_url("data:image/png;base64,YQ==").ok(),
            Some(("image/png", "YQ=="))
        );
    }

    #[test]
    fn byte_len_never_underflows_on_padding_only_payload() {
        let asset = ImageAsset {
            data_url: "data:image/png;base64,==".to_string(),
            base64: "==".to_string(),
            mime_type: "image/png".to_string(),
        };
        assert_eq!(asset.byte_len(), 0);
    }
}
