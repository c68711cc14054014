//! 팝업 프레젠터.
//!
//! 캡처 세션 상태 → 팝업 페이로드 변환.

use chrono::{DateTime, SecondsFormat, Utc};
use screensense_core::models::capture::{AiStatus, CaptureRecord};
use screensense_core::models::popup::{PopupPayload, PopupUpdate};

/// 단축키가 하나도 없을 때 표시 문자열
pub const SHORTCUT_NOT_SET: &str = "Not set";

/// 페이로드 계산에 필요한 세션 플래그
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFlags {
    pub ai_enabled: bool,
    pub enhance_in_progress: bool,
}

/// 세션 상태 → 팝업 페이로드
///
/// 레코드가 없으면 `idle` 상태와 현재 시각으로 채운다.
pub fn build_payload(
    record: Option<&CaptureRecord>,
    flags: SessionFlags,
    shortcut: &str,
    update: PopupUpdate,
    now: DateTime<Utc>,
) -> PopupPayload {
    let ai_status = record.map(|r| r.ai_status).unwrap_or(AiStatus::Idle);
    let has_description = record.is_some_and(CaptureRecord::has_description);

    PopupPayload {
        file_name: record.map(|r| r.file_name.clone()),
        file_path: record.map(|r| r.file_path.display().to_string()),
        timestamp: iso_timestamp(record.map(|r| r.timestamp).unwrap_or(now)),
        ai_status,
        ai_description: record.and_then(|r| r.ai_description.clone()),
        ai_enhanced_description: record.and_then(|r| r.ai_enhanced_description.clone()),
        actions: record.map(|r| r.actions.clone()).unwrap_or_default(),
        resources: record.map(|r| r.resources.clone()).unwrap_or_default(),
        can_enhance: flags.ai_enabled
            && has_description
            && !flags.enhance_in_progress
            && ai_status.allows_enhance(),
        can_delete: record.is_some(),
        shortcut: shortcut.to_string(),
        update,
    }
}

/// 밀리초 정밀도 UTC ISO 8601 (`2024-05-01T10:00:00.000Z`)
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 단축키 표시 문자열: 등록된 단축키 > 첫 번째 후보 > "Not set"
pub fn shortcut_display(registered: Option<&str>, candidates: &[String]) -> String {
    registered
        .map(str::to_string)
        .or_else(|| candidates.first().cloned())
        .unwrap_or_else(|| SHORTCUT_NOT_SET.to_string())
}
