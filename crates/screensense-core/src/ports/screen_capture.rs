//! 스크린 캡처 포트.
//!
//! 구현: `screensense-vision` crate (xcap)

use async_trait::async_trait;
use std::path::Path;

use crate::error::CoreError;
use crate::models::capture::CapturedFile;

/// 주 디스플레이를 캡처하여 폴더에 저장
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// 폴더가 없으면 생성하고, 타임스탬프 이름의 PNG로 저장한다.
    async fn capture(&self, folder: &Path) -> Result<CapturedFile, CoreError>;
}
