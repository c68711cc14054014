//! 캡처 레코드와 AI 상태.
//!
//! 메모리에는 최신 캡처 하나만 유지된다. 새 캡처는 레코드 전체를 교체하며,
//! 이전 캡처의 기록은 결과 로그에만 남는다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::assist::{Action, Resource};

/// 캡처 레코드의 AI 상태
///
/// `pending → complete | skipped | error`, `complete | enhanced → enhancing → enhanced`
/// 순서로만 전이한다. 보강 실패 시 진입 직전 상태로 되돌아간다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiStatus {
    /// 캡처 없음
    #[default]
    Idle,
    /// 캡처 완료, 초기 설명 대기 중
    Pending,
    /// 캡처 완료, AI 비활성화
    Disabled,
    /// 초기 설명 수신
    Complete,
    /// AI가 사용할 수 있는 결과를 반환하지 않음
    Skipped,
    /// 초기 설명 호출 실패
    Error,
    /// 보강 요청 진행 중
    Enhancing,
    /// 보강 완료
    Enhanced,
}

impl AiStatus {
    /// 보강 요청이 허용되는 상태인지
    pub fn allows_enhance(&self) -> bool {
        matches!(self, AiStatus::Complete | AiStatus::Enhanced)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiStatus::Idle => "idle",
            AiStatus::Pending => "pending",
            AiStatus::Disabled => "disabled",
            AiStatus::Complete => "complete",
            AiStatus::Skipped => "skipped",
            AiStatus::Error => "error",
            AiStatus::Enhancing => "enhancing",
            AiStatus::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for AiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 디스크에 기록된 스크린샷 파일
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFile {
    /// 파일 이름 (결과 로그의 키)
    pub file_name: String,
    /// 절대 경로
    pub file_path: PathBuf,
}

/// 현재 스크린샷의 수명주기 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub file_name: String,
    pub file_path: PathBuf,
    /// 캡처 시각
    pub timestamp: DateTime<Utc>,
    pub ai_status: AiStatus,
    /// 초기 설명
    pub ai_description: Option<String>,
    /// 보강 설명
    pub ai_enhanced_description: Option<String>,
    pub actions: Vec<Action>,
    pub resources: Vec<Resource>,
    /// 제공자가 응답한 모델 ID
    pub ai_model: Option<String>,
    /// 제공자 응답 ID
    pub ai_response_id: Option<String>,
}

impl CaptureRecord {
    /// 캡처 직후 레코드 생성 (AI 활성화 여부에 따라 `pending`/`disabled`)
    pub fn new(file: CapturedFile, timestamp: DateTime<Utc>, ai_enabled: bool) -> Self {
        Self {
            file_name: file.file_name,
            file_path: file.file_path,
            timestamp,
            ai_status: if ai_enabled {
                AiStatus::Pending
            } else {
                AiStatus::Disabled
            },
            ai_description: None,
            ai_enhanced_description: None,
            actions: Vec::new(),
            resources: Vec::new(),
            ai_model: None,
            ai_response_id: None,
        }
    }

    /// 초기 설명이 있는지 (빈 문자열 제외)
    pub fn has_description(&self) -> bool {
        self.ai_description
            .as_deref()
            .is_some_and(|d| !d.is_empty())
    }
}
