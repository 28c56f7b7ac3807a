use crate::assets::AssetLoader;
use serde::Deserialize;
use std::time::Duration;

const MIB: usize = 1024 * 1024;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-feature upload ceilings
    #[serde(default)]
    pub uploads: UploadsConfig,

    #[serde(default)]
    pub compress: CompressConfig,

    #[serde(default)]
    pub vendors: VendorsConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to (overridden by BIND_ADDR)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadLimit {
    pub max_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    #[serde(default = "default_compress_limit")]
    pub compress: UploadLimit,

    #[serde(default = "default_remove_bg_limit")]
    pub remove_bg: UploadLimit,

    #[serde(default = "default_recognize_limit")]
    pub recognize: UploadLimit,
}

fn default_compress_limit() -> UploadLimit {
    UploadLimit { max_bytes: 12 * MIB }
}

fn default_remove_bg_limit() -> UploadLimit {
    UploadLimit { max_bytes: 12 * MIB }
}

fn default_recognize_limit() -> UploadLimit {
    UploadLimit { max_bytes: 10 * MIB }
}

impl UploadsConfig {
    /// Largest ceiling across features, used to size the router body limit.
    pub fn largest(&self) -> usize {
        self.compress
            .max_bytes
            .max(self.remove_bg.max_bytes)
            .max(self.recognize.max_bytes)
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            compress: default_compress_limit(),
            remove_bg: default_remove_bg_limit(),
            recognize: default_recognize_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompressConfig {
    /// Quality used when the request does not specify one
    #[serde(default = "default_quality")]
    pub default_quality: u8,
}

fn default_quality() -> u8 {
    80
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VendorsConfig {
    #[serde(default)]
    pub ark: ArkConfig,

    #[serde(default)]
    pub remove_bg: RemoveBgConfig,
}

/// Volcengine Ark endpoints (image generation and vision chat)
#[derive(Debug, Deserialize, Clone)]
pub struct ArkConfig {
    #[serde(default = "default_ark_base_url")]
    pub base_url: String,

    /// Endpoint id of the image generation model
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Endpoint id of the vision chat model
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ark_base_url() -> String {
    "https://ark.cn-beijing.volces.com".to_string()
}

fn default_image_model() -> String {
    "ep-20250922151247-nzclw".to_string()
}

fn default_vision_model() -> String {
    "ep-20250921140145-v9tg9".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl ArkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ArkConfig {
    fn default() -> Self {
        Self {
            base_url: default_ark_base_url(),
            image_model: default_image_model(),
            vision_model: default_vision_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoveBgConfig {
    #[serde(default = "default_remove_bg_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_remove_bg_base_url() -> String {
    "https://api.remove.bg".to_string()
}

impl RemoveBgConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoveBgConfig {
    fn default() -> Self {
        Self {
            base_url: default_remove_bg_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Maximum number of generated images remembered
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    50
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::info!(
                        ark_base_url = %config.vendors.ark.base_url,
                        remove_bg_base_url = %config.vendors.remove_bg.base_url,
                        history_capacity = config.history.capacity,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}
