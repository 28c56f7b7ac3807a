use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Visual style applied to a generation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Realistic,
    Artistic,
    Anime,
    Cartoon,
    Digital,
    Watercolor,
}

impl Style {
    pub const ALL: [Style; 6] = [
        Self::Realistic,
        Self::Artistic,
        Self::Anime,
        Self::Cartoon,
        Self::Digital,
        Self::Watercolor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realistic => "realistic",
            Self::Artistic => "artistic",
            Self::Anime => "anime",
            Self::Cartoon => "cartoon",
            Self::Digital => "digital",
            Self::Watercolor => "watercolor",
        }
    }

    /// Descriptor appended to the user's prompt.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::Realistic => "realistic style, photorealistic, high quality photography",
            Self::Artistic => "artistic style, oil painting texture, abstract art",
            Self::Anime => "anime style, Japanese illustration",
            Self::Cartoon => "cartoon style, cute, cartoon illustration",
            Self::Digital => "digital art, modern design",
            Self::Watercolor => "watercolor painting, watercolor texture",
        }
    }

    pub fn enhance(&self, prompt: &str) -> String {
        format!("{}, {}", prompt.trim(), self.descriptor())
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| format!("unknown style '{s}'"))
    }
}

/// Output size offered to clients, mapped onto the vendor's size values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePreset {
    #[default]
    Square512,
    Landscape768x512,
    Portrait512x768,
    Square1024,
    Landscape1024x768,
    Portrait768x1024,
}

impl SizePreset {
    pub const ALL: [SizePreset; 6] = [
        Self::Square512,
        Self::Landscape768x512,
        Self::Portrait512x768,
        Self::Square1024,
        Self::Landscape1024x768,
        Self::Portrait768x1024,
    ];

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Square512 => (512, 512),
            Self::Landscape768x512 => (768, 512),
            Self::Portrait512x768 => (512, 768),
            Self::Square1024 => (1024, 1024),
            Self::Landscape1024x768 => (1024, 768),
            Self::Portrait768x1024 => (768, 1024),
        }
    }

    /// Size value sent to the vendor. The vendor rejects images under
    /// 921600 pixels, so the small presets are sent as `1k`.
    pub fn vendor_size(&self) -> &'static str {
        match self {
            Self::Square512 | Self::Landscape768x512 | Self::Portrait512x768 => "1k",
            Self::Square1024 => "2k",
            Self::Landscape1024x768 => "1024x768",
            Self::Portrait768x1024 => "768x1024",
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{w}x{h}")
    }
}

impl FromStr for SizePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .to_ascii_lowercase()
            .split_once(['x', '×'])
            .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)))
            .ok_or_else(|| format!("size '{s}' is not WIDTHxHEIGHT"))?;

        Self::ALL
            .into_iter()
            .find(|preset| preset.dimensions() == (w, h))
            .ok_or_else(|| format!("size {w}x{h} is not one of the supported presets"))
    }
}

impl Serialize for SizePreset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A successful generation, as kept in the history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeneratedImage {
    pub id: u64,
    /// Vendor URL of the generated image
    pub url: String,
    /// Prompt as sent to the vendor (with style descriptor)
    pub prompt: String,
    pub original_prompt: String,
    pub style: Style,
    #[schema(value_type = String, example = "512x512")]
    pub size: SizePreset,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    /// File name offered when downloading, e.g. `ai_generated_a_red_fox_1700000000000.jpg`.
    pub fn download_name(&self) -> String {
        let head: String = self
            .original_prompt
            .chars()
            .take(20)
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "ai_generated_{}_{}.jpg",
            head,
            self.created_at.timestamp_millis()
        )
    }
}
