use crate::foundation::error::{InkframeError, InkframeResult};
use crate::providers::ImageGenerator;
use crate::providers::http::HttpClient;

pub const DEFAULT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";

/// Hugging Face hosted inference, text-to-image.
#[derive(Debug, Clone)]
pub struct HuggingFace {
    http: HttpClient,
    token: String,
    model_url: String,
}

impl HuggingFace {
    pub fn new(http: HttpClient, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
            model_url: DEFAULT_MODEL_URL.to_owned(),
        }
    }

    pub fn with_model_url(mut self, url: impl Into<String>) -> Self {
        self.model_url = url.into();
        self
    }
}

impl ImageGenerator for HuggingFace {
    #[tracing::instrument(skip(self))]
    fn generate(&self, prompt: &str) -> InkframeResult<Vec<u8>> {
        let auth = format!("Bearer {}", self.token);
        let (bytes, content_type) = self.http.post_json(
            &self.model_url,
            &serde_json::json!({ "inputs": prompt }),
            &[("Authorization", auth.as_str())],
        )?;
        check_image_response(bytes, content_type.as_deref())
    }
}

// The endpoint answers 200 with a JSON error body while a model is loading.
pub(crate) fn check_image_response(
    bytes: Vec<u8>,
    content_type: Option<&str>,
) -> InkframeResult<Vec<u8>> {
    if content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Ok(bytes);
    }
    let detail = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_else(|| format!("unexpected content type {content_type:?}"));
    Err(InkframeError::upstream(format!("image generation failed: {detail}")))
}
