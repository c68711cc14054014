//! ScreenSense 도메인 모델.
//!
//! 캡처 레코드, AI assist 메타데이터, 결과 로그 항목, 팝업 페이로드.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod ai_log;
pub mod assist;
pub mod capture;
pub mod popup;
