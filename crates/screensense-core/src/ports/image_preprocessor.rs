//! 업로드 전 이미지 전처리 포트.
//!
//! 구현: `screensense-vision` crate (image, fast_image_resize)

use std::path::Path;

use crate::config::ImageCompressionConfig;
use crate::error::CoreError;

/// 업로드 준비가 끝난 이미지
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// 전송할 바이트
    pub bytes: Vec<u8>,
    /// data URL에 사용할 MIME 타입
    pub media_type: String,
    /// 원본 파일 크기
    pub original_size: usize,
    /// 재인코딩 여부 (false면 원본 그대로)
    pub compressed: bool,
}

/// 이미지 전처리기 (CPU 작업이므로 동기 trait, 호출 측에서 spawn_blocking)
pub trait ImagePreprocessor: Send + Sync {
    /// 압축 실패는 원본 바이트로 대체한다. 원본 파일 읽기 실패만 에러로 반환한다.
    fn prepare(
        &self,
        path: &Path,
        config: &ImageCompressionConfig,
    ) -> Result<PreparedImage, CoreError>;
}
