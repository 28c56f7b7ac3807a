pub mod config;
pub mod credentials;
pub mod generation;
pub mod upload;

pub use config::{AppConfig, ArkConfig, RemoveBgConfig, UploadsConfig};
pub use credentials::{ApiKey, Credentials, ARK_API_KEY_ENV, REMOVE_BG_API_KEY_ENV};
pub use generation::{GeneratedImage, SizePreset, Style};
pub use upload::{ImageMime, UploadPolicy, UploadedFile};
