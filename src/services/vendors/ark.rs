//! Volcengine Ark client: image generation and vision chat.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    build_http_client, ensure_success, require_key, Generation, GenerationRequest,
    ImageGenerator, ImageRecognizer, Recognition,
};
use crate::error::VendorError;
use crate::models::{ApiKey, ArkConfig, ImageMime, ARK_API_KEY_ENV};

const VENDOR: &str = "ark";

pub const DEFAULT_QUESTION: &str = "What is the main content of this image?";

#[derive(Serialize)]
struct ImageGenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    sequential_image_generation: &'static str,
    response_format: &'static str,
    size: &'static str,
    stream: bool,
    watermark: bool,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedData>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Deserialize)]
struct GeneratedData {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for the Ark `images/generations` and `chat/completions` APIs
pub struct ArkClient {
    http: reqwest::Client,
    base_url: String,
    image_model: String,
    vision_model: String,
    api_key: Option<ApiKey>,
}

impl ArkClient {
    pub fn new(config: &ArkConfig, api_key: Option<ApiKey>) -> Result<Self, VendorError> {
        Ok(Self {
            http: build_http_client(config.timeout())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_model: config.image_model.clone(),
            vision_model: config.vision_model.clone(),
            api_key,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<u8>, VendorError> {
        let key = require_key(self.api_key.as_ref(), ARK_API_KEY_ENV)?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(key.expose())
            .json(body)
            .send()
            .await?;
        let response = ensure_success(VENDOR, response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn parse<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, VendorError> {
    serde_json::from_slice(body).map_err(|e| VendorError::Malformed(e.to_string()))
}

#[async_trait]
impl ImageGenerator for ArkClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, VendorError> {
        if request.prompt.trim().is_empty() {
            return Err(VendorError::MissingInput("prompt"));
        }

        let prompt = request.style.enhance(&request.prompt);
        let body = ImageGenerationBody {
            model: &self.image_model,
            prompt: &prompt,
            sequential_image_generation: "disabled",
            response_format: "url",
            size: request.size.vendor_size(),
            stream: false,
            watermark: true,
        };

        tracing::info!(
            style = %request.style,
            size = %request.size,
            vendor_size = body.size,
            "Requesting image generation"
        );

        let raw = self.post_json("/api/v3/images/generations", &body).await?;
        let parsed: ImageGenerationResponse = parse(&raw)?;

        let url = parsed
            .data
            .into_iter()
            .find_map(|d| d.url.filter(|u| !u.is_empty()))
            .ok_or_else(|| VendorError::Malformed("response contains no image URL".to_string()))?;

        tracing::info!(url = %url, "Image generated");

        Ok(Generation {
            url,
            prompt,
            usage: parsed.usage,
        })
    }
}

#[async_trait]
impl ImageRecognizer for ArkClient {
    async fn recognize(
        &self,
        image: &[u8],
        mime: ImageMime,
        question: &str,
    ) -> Result<Recognition, VendorError> {
        if image.is_empty() {
            return Err(VendorError::MissingInput("image"));
        }
        let question = match question.trim() {
            "" => DEFAULT_QUESTION,
            q => q,
        };

        let data_url = format!("data:image/{};base64,{}", mime.subtype(), STANDARD.encode(image));
        let body = ChatBody {
            model: &self.vision_model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: question },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
        };

        tracing::info!(image_type = %mime, image_size = image.len(), "Requesting image recognition");

        let raw = self.post_json("/api/v3/chat/completions", &body).await?;
        let parsed: ChatResponse = parse(&raw)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| VendorError::Malformed("response contains no answer".to_string()))?;

        Ok(Recognition {
            content,
            usage: parsed.usage,
        })
    }
}
