//! ScreenSense 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 `#[from] CoreError`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 네트워크, 이미지 처리 등 파이프라인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패, {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 네트워크 에러 (연결 실패, 응답 읽기 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// AI 제공자 오류 응답 (non-2xx)
    #[error("AI 제공자 오류 ({status}): {message}")]
    Provider {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문 요약
        message: String,
    },

    /// 이미지 디코딩/리사이즈/인코딩 실패
    #[error("이미지 처리 에러: {0}")]
    Image(String),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Monitor", "Screenshot")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 파일이 이미 없는 경우인지 (삭제 멱등성 판단용)
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            CoreError::NotFound { .. } => true,
            _ => false,
        }
    }
}
