//! 액션/리소스 확인 처리.
//!
//! UI가 보낸 JSON은 신뢰하지 않는다. 검증된 값으로 파싱한 뒤 확인 대화상자를 띄우고,
//! 사용자가 고른 버튼에 따라 클립보드 복사나 브라우저 열기를 수행한다.

use screensense_core::models::assist::{Action, Resource};
use screensense_core::ports::desktop_shell::{ConfirmDialog, DesktopShell};
use serde_json::Value;
use tracing::{error, info};

/// 사용자 액션 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    /// 명령을 클립보드로 복사
    Copied,
    /// 명령 없는 액션 확인
    Acknowledged,
    /// 브라우저로 열기
    Opened,
    /// 사용자가 취소
    Cancelled,
    /// 입력 검증 실패
    Rejected(String),
    /// 클립보드/브라우저/대화상자 실패
    Failed(String),
}

impl AckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            AckOutcome::Copied | AckOutcome::Acknowledged | AckOutcome::Opened
        )
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

/// UI 액션 페이로드 검증 (제목 없으면 "Suggested action")
pub fn parse_action(raw: &Value) -> Result<Action, String> {
    if !raw.is_object() {
        return Err("Invalid action payload".to_string());
    }
    let action = Action {
        title: string_field(raw, "title").unwrap_or_else(|| "Suggested action".to_string()),
        command: string_field(raw, "command").unwrap_or_default(),
        notes: string_field(raw, "notes").unwrap_or_default(),
    };
    if action.title.trim().is_empty() && action.command.trim().is_empty() {
        return Err("Action is missing a title and command".to_string());
    }
    Ok(action)
}

/// UI 리소스 페이로드 검증 (URL 필수, 제목 없으면 "Reference")
pub fn parse_resource(raw: &Value) -> Result<Resource, String> {
    if !raw.is_object() {
        return Err("Invalid resource payload".to_string());
    }
    let resource = Resource {
        title: string_field(raw, "title").unwrap_or_else(|| "Reference".to_string()),
        url: string_field(raw, "url").unwrap_or_default(),
        reason: string_field(raw, "reason").unwrap_or_default(),
    };
    if resource.url.trim().is_empty() {
        return Err("Resource is missing a URL".to_string());
    }
    Ok(resource)
}

fn join_detail(parts: &[&str]) -> Option<String> {
    let parts: Vec<&str> = parts.iter().copied().filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// 액션 대화상자 구성
pub fn action_dialog(action: &Action) -> ConfirmDialog {
    let buttons: Vec<String> = if action.command.is_empty() {
        vec!["OK".to_string(), "Cancel".to_string()]
    } else {
        vec!["Copy to Clipboard".to_string(), "Cancel".to_string()]
    };
    ConfirmDialog {
        title: "Confirm Assistant Action".to_string(),
        message: action.title.clone(),
        detail: join_detail(&[&action.command, &action.notes]),
        cancel_id: buttons.len() - 1,
        default_id: 0,
        buttons,
    }
}

/// 리소스 대화상자 구성
pub fn resource_dialog(resource: &Resource) -> ConfirmDialog {
    ConfirmDialog {
        title: "Open Suggested Resource".to_string(),
        message: resource.title.clone(),
        detail: join_detail(&[&resource.url, &resource.reason]),
        buttons: vec![
            "Open Link".to_string(),
            "Copy URL".to_string(),
            "Cancel".to_string(),
        ],
        default_id: 0,
        cancel_id: 2,
    }
}

/// 액션 확인 → 명령이 있으면 클립보드 복사
pub async fn acknowledge_action(shell: &dyn DesktopShell, raw: &Value) -> AckOutcome {
    let action = match parse_action(raw) {
        Ok(action) => action,
        Err(reason) => return AckOutcome::Rejected(reason),
    };

    let choice = match shell.confirm(&action_dialog(&action)).await {
        Ok(choice) => choice,
        Err(e) => {
            error!("액션 대화상자 실패: {e}");
            return AckOutcome::Failed(e.to_string());
        }
    };

    if choice != Some(0) {
        info!(title = %action.title, "액션 취소");
        return AckOutcome::Cancelled;
    }

    if action.command.is_empty() {
        info!(title = %action.title, "액션 확인");
        return AckOutcome::Acknowledged;
    }

    match shell.copy_text(&action.command).await {
        Ok(()) => {
            info!(title = %action.title, "액션 명령 클립보드 복사");
            AckOutcome::Copied
        }
        Err(e) => {
            error!(title = %action.title, "클립보드 복사 실패: {e}");
            AckOutcome::Failed(e.to_string())
        }
    }
}

/// 리소스 확인 → 열기 또는 URL 복사
pub async fn open_resource(shell: &dyn DesktopShell, raw: &Value) -> AckOutcome {
    let resource = match parse_resource(raw) {
        Ok(resource) => resource,
        Err(reason) => return AckOutcome::Rejected(reason),
    };

    let choice = match shell.confirm(&resource_dialog(&resource)).await {
        Ok(choice) => choice,
        Err(e) => {
            error!("리소스 대화상자 실패: {e}");
            return AckOutcome::Failed(e.to_string());
        }
    };

    match choice {
        Some(0) => match shell.open_url(&resource.url).await {
            Ok(()) => {
                info!(title = %resource.title, url = %resource.url, "리소스 열기");
                AckOutcome::Opened
            }
            Err(e) => {
                error!(url = %resource.url, "리소스 열기 실패: {e}");
                AckOutcome::Failed(e.to_string())
            }
        },
        Some(1) => match shell.copy_text(&resource.url).await {
            Ok(()) => {
                info!(title = %resource.title, url = %resource.url, "리소스 URL 복사");
                AckOutcome::Copied
            }
            Err(e) => {
                error!(url = %resource.url, "URL 복사 실패: {e}");
                AckOutcome::Failed(e.to_string())
            }
        },
        _ => {
            info!(title = %resource.title, "리소스 닫음");
            AckOutcome::Cancelled
        }
    }
}
