//! 결과 로그 항목.
//!
//! 스크린샷 폴더의 `ai_results.json` 배열에 파일당 하나씩 기록된다.
//! 저장소는 같은 `file` 키의 기존 항목 위에 이 항목의 필드를 얕게 덮어쓴다.

use serde::{Deserialize, Serialize};

use super::assist::{Action, Resource};

/// 결과 로그 파일 이름
pub const AI_LOG_FILE_NAME: &str = "ai_results.json";

/// 결과 로그 기본 보관 한도
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// 결과 로그 항목
///
/// `None` 필드는 직렬화하지 않으므로 병합 시 기존 값을 지우지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 스크린샷 파일 이름 (병합 키)
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_enhanced_description: Option<String>,
    /// 캡처 시각 (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(
        default,
        rename = "responseId",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
    /// 보강 응답이 제안한 액션 (주 목록과 별도 기록)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_resources: Option<Vec<Resource>>,
}

impl LogEntry {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }
}
