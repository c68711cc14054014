//! 업로드 전 이미지 전처리.
//!
//! 너비 상한을 넘으면 축소하고, 항상 지정 품질의 JPEG로 재인코딩한다.
//! 디코딩/리사이즈/인코딩 중 하나라도 실패하면 원본 바이트를 그대로 보낸다.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use screensense_core::config::{ImageCompressionConfig, DEFAULT_JPEG_QUALITY};
use screensense_core::error::CoreError;
use screensense_core::ports::image_preprocessor::{ImagePreprocessor, PreparedImage};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::resize::{fast_resize, fit_within_width};

const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// JPEG 재인코딩 전처리기
#[derive(Debug, Default, Clone)]
pub struct JpegPreprocessor;

impl JpegPreprocessor {
    pub fn new() -> Self {
        Self
    }

    fn compress(bytes: &[u8], config: &ImageCompressionConfig) -> Result<Vec<u8>, CoreError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CoreError::Image(format!("이미지 디코딩 실패: {e}")))?;

        let image = match fit_within_width(image.width(), image.height(), config.max_width) {
            Some((w, h)) => fast_resize(&image, w, h)?,
            None => image,
        };

        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, effective_quality(config.quality));
        rgb.write_with_encoder(encoder)
            .map_err(|e| CoreError::Image(format!("JPEG 인코딩 실패: {e}")))?;
        Ok(out)
    }
}

/// 설정 품질 보정: 0은 기본값, 100 초과는 100
pub fn effective_quality(quality: u8) -> u8 {
    match quality {
        0 => DEFAULT_JPEG_QUALITY,
        q => q.min(100),
    }
}

/// 원본 바이트의 MIME 타입 추정 (알 수 없으면 PNG)
fn sniff_media_type(bytes: &[u8]) -> String {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| "image/png".to_string())
}

impl ImagePreprocessor for JpegPreprocessor {
    fn prepare(
        &self,
        path: &Path,
        config: &ImageCompressionConfig,
    ) -> Result<PreparedImage, CoreError> {
        let original = std::fs::read(path)?;
        let original_size = original.len();

        if !config.enabled {
            debug!(path = %path.display(), "이미지 압축 비활성화, 원본 전송");
            return Ok(PreparedImage {
                media_type: sniff_media_type(&original),
                bytes: original,
                original_size,
                compressed: false,
            });
        }

        match Self::compress(&original, config) {
            Ok(bytes) => {
                let saved = if original_size > 0 {
                    100.0 - (bytes.len() as f64 / original_size as f64 * 100.0)
                } else {
                    0.0
                };
                info!(
                    original_kb = original_size / 1024,
                    compressed_kb = bytes.len() / 1024,
                    saved_percent = format!("{saved:.1}"),
                    "이미지 압축 완료"
                );
                Ok(PreparedImage {
                    bytes,
                    media_type: JPEG_MEDIA_TYPE.to_string(),
                    original_size,
                    compressed: true,
                })
            }
            Err(e) => {
                warn!(path = %path.display(), "이미지 압축 실패, 원본 사용: {e}");
                Ok(PreparedImage {
                    media_type: sniff_media_type(&original),
                    bytes: original,
                    original_size,
                    compressed: false,
                })
            }
        }
    }
}
