pub mod compressor;
pub mod history;
pub mod vendors;

pub use compressor::{CompressOptions, CompressService, CompressedImage};
pub use history::GenerationHistory;
pub use vendors::{
    ArkClient, BackgroundRemover, Generation, GenerationRequest, ImageFetcher, ImageGenerator,
    ImageRecognizer, Recognition, RemoveBgClient, VendorImage,
};
