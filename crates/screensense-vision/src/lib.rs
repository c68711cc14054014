//! # screensense-vision
//!
//! 이미지 처리 크레이트.
//! xcap 기반 스크린 캡처와, AI 업로드 전 리사이즈 + JPEG 재인코딩 전처리를 담당한다.

pub mod capture;
pub mod preprocessor;
pub mod resize;
