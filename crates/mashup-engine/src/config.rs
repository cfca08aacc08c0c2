use std::env;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Fixed instruction sent alongside the two images.
pub const MASHUP_PROMPT: &str = "Create a new, photorealistic image that shows the character \
from the first image holding or using the product from the second image. Keep the character's \
appearance, outfit, and art style recognisable, keep the product's shape, colours, and branding \
accurate, and place them together in a natural setting with consistent lighting.";

const API_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Settings for the generation requesters, resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub prompt: String,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            prompt: MASHUP_PROMPT.to_string(),
        }
    }
}

impl RequesterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves settings through `lookup` so callers can supply their own
    /// variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            api_base: non_empty("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            api_key: API_KEY_VARS.iter().find_map(|key| non_empty(*key)),
            model: non_empty("MASHUP_IMAGE_MODEL").unwrap_or(defaults.model),
            prompt: defaults.prompt,
        }
    }

    pub fn with_model(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model.map(str::trim).filter(|value| !value.is_empty()) {
            self.model = model.to_string();
        }
        self
    }

    pub fn missing_key_message() -> String {
        format!("{} not set", API_KEY_VARS.join(" or "))
    }
}
