//! # screensense-suggestion
//!
//! AI 응답 후처리와 사용자 제안 처리.
//!
//! - [`extractor`]: 마크다운 응답에서 assist 블록(액션/리소스) 분리
//! - [`presenter`]: 캡처 세션 상태 → 팝업 페이로드 투영
//! - [`acknowledge`]: UI에서 온 액션/리소스 요청 검증 및 확인 대화상자 처리

pub mod acknowledge;
pub mod extractor;
pub mod presenter;
