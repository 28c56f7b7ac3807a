//! Local image re-encoding.
//!
//! PNG input stays PNG (lossless, then optimised with oxipng). Every other
//! accepted type is re-encoded as JPEG at the requested quality.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

use crate::error::CompressError;
use crate::models::ImageMime;

pub const MIN_QUALITY: u8 = 10;
pub const MAX_QUALITY: u8 = 100;

/// Parameters of a single compression request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    quality: u8,
    max_dimension: Option<u32>,
}

impl CompressOptions {
    pub fn new(quality: u8, max_dimension: Option<u32>) -> Result<Self, CompressError> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressError::QualityOutOfRange(quality));
        }
        if max_dimension == Some(0) {
            return Err(CompressError::ZeroMaxDimension);
        }
        Ok(Self {
            quality,
            max_dimension,
        })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn max_dimension(&self) -> Option<u32> {
        self.max_dimension
    }
}

/// Result of a compression
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub mime: ImageMime,
    pub width: u32,
    pub height: u32,
    pub original_size: usize,
}

impl CompressedImage {
    pub fn compressed_size(&self) -> usize {
        self.bytes.len()
    }

    /// Name offered for download, e.g. `compressed_holiday.jpg`
    pub fn download_name(&self, stem: &str) -> String {
        format!("compressed_{}.{}", stem, self.mime.extension())
    }
}

/// Output type for a given input type.
pub fn output_mime(input: ImageMime) -> ImageMime {
    match input {
        ImageMime::Png => ImageMime::Png,
        _ => ImageMime::Jpeg,
    }
}

/// Dimensions that fit inside a `cap`x`cap` box, preserving aspect ratio.
///
/// The longer side becomes exactly `cap`; the shorter side is rounded and
/// never drops below 1.
pub fn fit_within(width: u32, height: u32, cap: u32) -> (u32, u32) {
    let longest = width.max(height);
    if cap == 0 || longest <= cap {
        return (width, height);
    }
    let scale = f64::from(cap) / f64::from(longest);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, cap);
    if width >= height {
        (cap, scaled(height))
    } else {
        (scaled(width), cap)
    }
}

/// Re-encode `input` according to `options`.
pub fn compress(
    input: &[u8],
    mime: ImageMime,
    options: &CompressOptions,
) -> Result<CompressedImage, CompressError> {
    if input.is_empty() {
        return Err(CompressError::Empty);
    }

    let source = image::load_from_memory_with_format(input, mime.image_format())
        .map_err(|e| CompressError::Decode(e.to_string()))?;
    let (src_width, src_height) = source.dimensions();

    let (width, height) = match options.max_dimension {
        Some(cap) => fit_within(src_width, src_height, cap),
        None => (src_width, src_height),
    };
    let resized = (width, height) != (src_width, src_height);
    let image = if resized {
        source.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        source
    };

    let out_mime = output_mime(mime);
    let encoded = match out_mime {
        ImageMime::Png => encode_png(&image)?,
        _ => encode_jpeg(&image, options.quality)?,
    };

    // Re-encoding an already small file at the same size and type can grow
    // it; keep the original in that case.
    let bytes = if !resized && out_mime == mime && encoded.len() > input.len() {
        tracing::debug!(
            original = input.len(),
            reencoded = encoded.len(),
            "Re-encoded output larger than input, keeping original"
        );
        input.to_vec()
    } else {
        encoded
    };

    tracing::debug!(
        input_type = %mime,
        output_type = %out_mime,
        quality = options.quality,
        src_width,
        src_height,
        width,
        height,
        original_size = input.len(),
        compressed_size = bytes.len(),
        "Image re-encoded"
    );

    Ok(CompressedImage {
        bytes,
        mime: out_mime,
        width,
        height,
        original_size: input.len(),
    })
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let rgb = flatten_onto_white(image);
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| CompressError::Encode(e.to_string()))?;
    Ok(out)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CompressError> {
    let mut png = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut png, CompressionType::Fast, PngFilter::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| CompressError::Encode(e.to_string()))?;

    // Re-compress with oxipng; fall back to the plain encoding if it fails
    let optimized = oxipng::optimize_from_memory(
        &png,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            ..Default::default()
        },
    )
    .unwrap_or(png);
    Ok(optimized)
}

/// Composite any alpha channel over white, since JPEG has no transparency.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Runs compression on the blocking thread pool.
#[derive(Debug, Default, Clone)]
pub struct CompressService;

impl CompressService {
    pub fn new() -> Self {
        Self
    }

    /// Compress without blocking the async runtime.
    pub async fn compress(
        &self,
        input: Vec<u8>,
        mime: ImageMime,
        options: CompressOptions,
    ) -> Result<CompressedImage, CompressError> {
        tokio::task::spawn_blocking(move || compress(&input, mime, &options))
            .await
            .map_err(|e| CompressError::Task(e.to_string()))?
    }
}
