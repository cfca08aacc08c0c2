use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use mashup_contracts::assets::{GenerationResult, ImageAsset};
use sha2::{Digest, Sha256};

use super::GenerationRequester;
use crate::error::GenerationError;

const DRYRUN_EDGE: u32 = 256;

/// Offline requester: renders a solid tile whose colour is a hash of both
/// inputs and the prompt, so the same inputs always give the same image.
pub struct DryrunRequester {
    prompt: String,
}

impl DryrunRequester {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    fn color_for(&self, character: &ImageAsset, product: &ImageAsset) -> (u8, u8, u8) {
        let mut hasher = Sha256::new();
        hasher.update(character.base64().as_bytes());
        hasher.update(product.base64().as_bytes());
        hasher.update(self.prompt.as_bytes());
        let digest = hasher.finalize();
        (digest[0], digest[1], digest[2])
    }
}

impl GenerationRequester for DryrunRequester {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(
        &self,
        character: &ImageAsset,
        product: &ImageAsset,
    ) -> Result<GenerationResult, GenerationError> {
        let (r, g, b) = self.color_for(character, product);
        let mut image = RgbImage::new(DRYRUN_EDGE, DRYRUN_EDGE);
        for pixel in image.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        let mut encoded = Cursor::new(Vec::new());
        image
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(|err| GenerationError::new(format!("dry-run render failed: {err}")))?;
        Ok(GenerationResult::from_bytes(
            &encoded.into_inner(),
            "image/png",
        ))
    }
}
