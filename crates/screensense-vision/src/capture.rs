//! 스크린 캡처.
//!
//! xcap으로 주 모니터를 캡처해 스크린샷 폴더에 PNG로 저장한다.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use image::DynamicImage;
use screensense_core::error::CoreError;
use screensense_core::models::capture::CapturedFile;
use screensense_core::ports::screen_capture::ScreenCapturer;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use xcap::Monitor;

/// 캡처 시각으로 파일 이름 생성 (초 단위 해상도)
pub fn screenshot_file_name(now: DateTime<Local>) -> String {
    format!("Screenshot_{}.png", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// 스크린 캡처: xcap 기반
#[derive(Debug, Default)]
pub struct XcapScreenCapturer;

impl XcapScreenCapturer {
    pub fn new() -> Self {
        Self
    }

    /// 주 모니터 캡처 (주 모니터를 못 찾으면 첫 번째 모니터)
    fn capture_primary() -> Result<DynamicImage, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::Internal(format!("모니터 목록 조회 실패: {e}")))?;

        let mut fallback = None;
        let mut primary = None;
        for monitor in monitors {
            if monitor.is_primary().unwrap_or(false) {
                primary = Some(monitor);
                break;
            }
            if fallback.is_none() {
                fallback = Some(monitor);
            }
        }

        let monitor = primary.or(fallback).ok_or_else(|| CoreError::NotFound {
            resource_type: "Monitor".to_string(),
            id: "primary".to_string(),
        })?;

        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Internal(format!("스크린 캡처 실패: {e}")))?;

        debug!("스크린 캡처 완료: {}x{}", image.width(), image.height());
        Ok(DynamicImage::ImageRgba8(image))
    }

    fn capture_to(folder: PathBuf) -> Result<CapturedFile, CoreError> {
        std::fs::create_dir_all(&folder)?;

        let image = Self::capture_primary()?;
        let file_name = screenshot_file_name(Local::now());
        let file_path = std::fs::canonicalize(&folder)?.join(&file_name);

        image
            .save_with_format(&file_path, image::ImageFormat::Png)
            .map_err(|e| CoreError::Image(format!("스크린샷 저장 실패: {e}")))?;

        info!(path = %file_path.display(), "스크린샷 저장");
        Ok(CapturedFile {
            file_name,
            file_path,
        })
    }
}

#[async_trait]
impl ScreenCapturer for XcapScreenCapturer {
    async fn capture(&self, folder: &Path) -> Result<CapturedFile, CoreError> {
        let folder = folder.to_path_buf();
        tokio::task::spawn_blocking(move || Self::capture_to(folder))
            .await
            .map_err(|e| CoreError::Internal(format!("캡처 작업 실패: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_uses_second_resolution_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(
            screenshot_file_name(at),
            "Screenshot_2024-03-07_09-05-02.png"
        );
    }
}
