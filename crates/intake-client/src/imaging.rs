//! Image preparation for the vision endpoint

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ExtendedColorType;
use intake_core::config::{DEFAULT_COMPRESS_THRESHOLD, DEFAULT_MAX_DIMENSION};
use intake_core::{ExtractError, ImageUpload};

const FALLBACK_MIME: &str = "image/jpeg";

/// Downscale settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Uploads above this many bytes are re-encoded
    pub compress_threshold: u64,
    /// Bounding box edge for re-encoded images
    pub max_dimension: u32,
    /// JPEG quality for re-encoded images
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            compress_threshold: DEFAULT_COMPRESS_THRESHOLD,
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: 70,
        }
    }
}

/// Image ready to embed in a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub mime: &'static str,
    pub base64: String,
    /// Whether the upload was decoded and re-encoded
    pub compressed: bool,
}

impl PreparedImage {
    /// `data:` URL for the `image_url` content part
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// Dimensions scaled to fit a `max`×`max` box, keeping the aspect ratio
///
/// Images already inside the box are left alone.
#[must_use]
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let scale = |long: u32, short: u32| -> u32 {
        let scaled = u64::from(short) * u64::from(max) / u64::from(long.max(1));
        u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
    };

    if width > height {
        if width > max {
            return (max, scale(width, height));
        }
    } else if height > max {
        return (scale(height, width), max);
    }
    (width, height)
}

/// Encode an upload for sending, re-encoding large files as JPEG
///
/// Decoding and encoding run on the blocking pool.
pub async fn prepare_image(
    upload: &ImageUpload,
    options: ImageOptions,
) -> Result<PreparedImage, ExtractError> {
    if upload.is_empty() {
        return Err(ExtractError::failed("empty image"));
    }

    if (upload.len() as u64) <= options.compress_threshold {
        let mime = image::guess_format(&upload.bytes)
            .map_or(FALLBACK_MIME, |format| format.to_mime_type());
        return Ok(PreparedImage {
            mime,
            base64: STANDARD.encode(&upload.bytes),
            compressed: false,
        });
    }

    let bytes = upload.bytes.clone();
    let original_len = bytes.len();
    let jpeg = tokio::task::spawn_blocking(move || compress(&bytes, options))
        .await
        .map_err(|e| ExtractError::failed(format!("image task failed: {e}")))??;

    tracing::debug!(
        "Compressed {} from {} to {} bytes",
        upload.file_name,
        original_len,
        jpeg.len()
    );

    Ok(PreparedImage {
        mime: FALLBACK_MIME,
        base64: STANDARD.encode(jpeg),
        compressed: true,
    })
}

fn compress(bytes: &[u8], options: ImageOptions) -> Result<Vec<u8>, ExtractError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ExtractError::failed(format!("cannot decode image: {e}")))?;

    let (width, height) = fit_within(decoded.width(), decoded.height(), options.max_dimension);
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };
    let rgb = resized.to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, options.jpeg_quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ExtractError::failed(format!("cannot encode image: {e}")))?;
    Ok(out)
}
