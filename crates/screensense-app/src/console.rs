//! 콘솔 명령 루프.
//!
//! 표준 입력 한 줄을 명령 하나로 해석해 캡처 세션에 전달한다.
//! 캡처와 보강은 별도 태스크로 실행해 진행 중에도 입력을 받는다.

use screensense_core::models::popup::PopupUpdate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::session::{CaptureSession, SessionError};
use crate::terminal_shell::SharedLines;

/// 콘솔 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Capture,
    Enhance,
    /// 1부터 시작하는 액션 번호
    Action(usize),
    /// 1부터 시작하는 리소스 번호
    Resource(usize),
    Delete,
    ToggleAi,
    /// 현재 팝업 다시 표시
    Show,
    Help,
    Quit,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let head = parts.next()?.to_ascii_lowercase();
        let index = parts.next().and_then(|n| n.parse::<usize>().ok()).unwrap_or(1);

        let command = match head.as_str() {
            "c" | "capture" => Self::Capture,
            "e" | "enhance" => Self::Enhance,
            "a" | "action" => Self::Action(index),
            "r" | "resource" => Self::Resource(index),
            "d" | "delete" => Self::Delete,
            "t" | "toggle" => Self::ToggleAi,
            "p" | "show" => Self::Show,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(line.trim().to_string()),
        };
        Some(command)
    }
}

pub const HELP_TEXT: &str = "\
commands:
  c          capture screenshot
  e          request enhanced description
  a <n>      run suggested action n
  r <n>      open suggested resource n
  d          delete current screenshot
  t          toggle AI descriptions
  p          show current popup
  q          quit";

/// 입력이 끝나거나 `q`를 받을 때까지 명령 처리
pub async fn run(session: Arc<CaptureSession>, lines: SharedLines) -> anyhow::Result<()> {
    println!("{HELP_TEXT}");

    loop {
        let Some(line) = lines.next_line().await? else {
            debug!("표준 입력 종료");
            break;
        };
        let Some(command) = ConsoleCommand::parse(&line) else {
            continue;
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        dispatch(&session, command).await;
    }

    info!("콘솔 종료");
    Ok(())
}

async fn dispatch(session: &Arc<CaptureSession>, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Capture => {
            let session = session.clone();
            tokio::spawn(async move {
                if let Err(e) = session.handle_capture_trigger().await {
                    warn!("캡처 흐름 실패: {e}");
                }
            });
        }
        ConsoleCommand::Enhance => {
            let session = session.clone();
            tokio::spawn(async move {
                match session.enhance().await {
                    Ok(outcome) => debug!(?outcome, "보강 완료"),
                    Err(e) => report_enhance_rejection(&e),
                }
            });
        }
        ConsoleCommand::Action(n) => {
            let Some(raw) = action_payload(session, n) else {
                println!("no action #{n}");
                return;
            };
            let outcome = session.run_action(&raw).await;
            println!("action: {outcome:?}");
        }
        ConsoleCommand::Resource(n) => {
            let Some(raw) = resource_payload(session, n) else {
                println!("no resource #{n}");
                return;
            };
            let outcome = session.open_resource(&raw).await;
            println!("resource: {outcome:?}");
        }
        ConsoleCommand::Delete => match session.delete().await {
            Ok(name) => println!("deleted {name}"),
            Err(SessionError::NoCapture) => println!("nothing to delete"),
            Err(e) => warn!("삭제 실패: {e}"),
        },
        ConsoleCommand::ToggleAi => match session.toggle_ai().await {
            Ok(enabled) => println!("AI descriptions {}", if enabled { "on" } else { "off" }),
            Err(e) => warn!("AI 토글 실패: {e}"),
        },
        ConsoleCommand::Show => {
            if session.current_record().is_some() {
                session.refresh_popup(PopupUpdate::default());
            } else {
                println!("no capture yet (shortcut: {})", session.shortcut_display());
            }
        }
        ConsoleCommand::Help => println!("{HELP_TEXT}"),
        ConsoleCommand::Unknown(input) => println!("unknown command: {input} (h for help)"),
        ConsoleCommand::Quit => {}
    }
}

/// 현재 레코드의 n번째 액션 (UI가 보내는 JSON 형태)
fn action_payload(session: &CaptureSession, n: usize) -> Option<Value> {
    let record = session.current_record()?;
    let action = record.actions.get(n.checked_sub(1)?)?;
    serde_json::to_value(action).ok()
}

fn resource_payload(session: &CaptureSession, n: usize) -> Option<Value> {
    let record = session.current_record()?;
    let resource = record.resources.get(n.checked_sub(1)?)?;
    serde_json::to_value(resource).ok()
}

/// 보강 거부 사유를 사용자 문구로 출력
fn report_enhance_rejection(e: &SessionError) {
    match e {
        SessionError::NoCapture => println!("No screenshot to enhance yet."),
        SessionError::AiDisabled => println!("AI descriptions are disabled."),
        SessionError::EnhanceInProgress => println!("Enhancement already in progress."),
        SessionError::CannotEnhance { status } => {
            println!("Cannot enhance while AI status is '{status}'.")
        }
        other => warn!("보강 실패: {other}"),
    }
}
