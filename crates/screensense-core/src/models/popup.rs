//! 팝업 투영 페이로드.
//!
//! 세션 상태를 UI가 그리는 형태로 투영한 값. 필드 이름은 camelCase로 직렬화된다.

use serde::{Deserialize, Serialize};

use super::assist::{Action, Resource};
use super::capture::AiStatus;

/// 팝업에 표시하는 진행 이벤트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PopupStatus {
    Captured,
    AiComplete,
    AiSkipped,
    AiError,
    Enhancing,
    AiEnhanced,
    DeleteError,
}

/// 페이로드에 덧붙이는 일회성 상태 메시지
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PopupStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 실패 시 에러 상세
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PopupUpdate {
    pub fn new(status: PopupStatus, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// 팝업 UI가 소비하는 전체 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupPayload {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    /// ISO 8601 시각
    pub timestamp: String,
    pub ai_status: AiStatus,
    pub ai_description: Option<String>,
    pub ai_enhanced_description: Option<String>,
    pub actions: Vec<Action>,
    pub resources: Vec<Resource>,
    /// AI 활성 + 설명 존재 + 보강 미진행 + 상태 complete/enhanced
    pub can_enhance: bool,
    /// 레코드 존재 여부
    pub can_delete: bool,
    /// 현재 단축키 표시 문자열
    pub shortcut: String,
    #[serde(flatten)]
    pub update: PopupUpdate,
}
