//! # screensense-core
//!
//! ScreenSense 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 캡처 → 전처리 → AI 설명 → 결과 로그 파이프라인의 모든 crate가 공유한다.
//!
//! ## 구조
//!
//! - [`models`]: 캡처 레코드, assist 메타데이터, 로그 항목, 팝업 페이로드
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/저장/리로드)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
