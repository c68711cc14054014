//! 고속 리사이즈.
//!
//! fast_image_resize 기반. 너비 상한을 넘는 이미지만 비율을 유지하며 줄인다.

use fast_image_resize::{images::Image as FirImage, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbaImage};
use screensense_core::error::CoreError;
use tracing::debug;

/// 너비 상한에 맞춘 목표 크기. 확대가 필요하면 `None`.
pub fn fit_within_width(width: u32, height: u32, max_width: u32) -> Option<(u32, u32)> {
    if max_width == 0 || width <= max_width {
        return None;
    }
    let scaled = (u64::from(height) * u64::from(max_width) + u64::from(width) / 2) / u64::from(width);
    Some((max_width, scaled.max(1) as u32))
}

/// RGBA 리사이즈
pub fn fast_resize(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, CoreError> {
    let (src_w, src_h) = (image.width(), image.height());

    if src_w == width && src_h == height {
        return Ok(image.clone());
    }
    if src_w == 0 || src_h == 0 {
        return Err(CoreError::Image("소스 이미지 크기 0".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(CoreError::Image("목표 이미지 크기 0".to_string()));
    }

    let src_image = FirImage::from_vec_u8(src_w, src_h, image.to_rgba8().into_raw(), PixelType::U8x4)
        .map_err(|e| CoreError::Image(format!("소스 이미지 생성 실패: {e}")))?;
    let mut dst_image = FirImage::new(width, height, PixelType::U8x4);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Lanczos3,
    ));
    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| CoreError::Image(format!("리사이즈 실패: {e}")))?;

    let result = RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| CoreError::Image("결과 이미지 생성 실패".to_string()))?;

    debug!("리사이즈: {}x{} → {}x{}", src_w, src_h, width, height);
    Ok(DynamicImage::ImageRgba8(result))
}
