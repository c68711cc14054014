//! 데스크톱 알림 어댑터.
//!
//! notify-rust로 OS 알림을 띄운다. 표시는 블로킹 호출이라 spawn_blocking에서 실행한다.

use async_trait::async_trait;
use notify_rust::Notification;
use screensense_core::error::CoreError;
use screensense_core::ports::notifier::DesktopNotifier;
use tracing::debug;

/// 알림 앱 이름
const APP_NAME: &str = "ScreenSense";

/// 데스크톱 알림 어댑터: `DesktopNotifier` 포트 구현
#[derive(Debug, Default)]
pub struct DesktopNotifierImpl;

impl DesktopNotifierImpl {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DesktopNotifier for DesktopNotifierImpl {
    async fn show_notification(&self, title: &str, body: &str) -> Result<(), CoreError> {
        debug!(title, "알림 표시");
        let title = title.to_string();
        let body = body.to_string();

        tokio::task::spawn_blocking(move || {
            Notification::new()
                .summary(&title)
                .body(&body)
                .appname(APP_NAME)
                .show()
                .map(|_| ())
                .map_err(|e| CoreError::Internal(format!("알림 표시 실패: {e}")))
        })
        .await
        .map_err(|e| CoreError::Internal(format!("알림 작업 실패: {e}")))?
    }
}
