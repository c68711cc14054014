//! # screensense-app
//!
//! ScreenSense 앱 조립 레이어.
//! 캡처 세션 컨트롤러, 설정 감시자, 데스크톱 어댑터(알림/클립보드/브라우저),
//! 터미널 팝업과 콘솔 루프를 제공한다. 바이너리 `screensense`가 이들을 와이어링한다.

pub mod config_watcher;
pub mod console;
pub mod console_popup;
pub mod notifier;
pub mod session;
pub mod terminal_shell;
