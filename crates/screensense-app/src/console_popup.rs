//! 터미널 팝업.
//!
//! 팝업 페이로드를 받은 순서대로 표준 출력에 그린다.

use screensense_core::models::popup::PopupPayload;
use screensense_core::ports::popup::PopupSink;
use std::io::Write;

/// 팝업 내용을 텍스트로 렌더링
pub fn render_payload(payload: &PopupPayload) -> String {
    let mut out = String::new();
    out.push_str("┌─ ScreenSense ─────────────────────────────\n");

    if let Some(message) = &payload.update.message {
        out.push_str(&format!("│ {message}\n"));
    }
    if let Some(error) = &payload.update.error {
        out.push_str(&format!("│ error: {error}\n"));
    }

    match &payload.file_name {
        Some(name) => out.push_str(&format!("│ file: {name} ({})\n", payload.timestamp)),
        None => out.push_str("│ no capture\n"),
    }
    out.push_str(&format!("│ AI status: {}\n", payload.ai_status));

    if let Some(description) = &payload.ai_description {
        out.push_str("│\n│ Description:\n");
        for line in description.lines() {
            out.push_str(&format!("│   {line}\n"));
        }
    }
    if let Some(enhanced) = &payload.ai_enhanced_description {
        out.push_str("│\n│ Enhanced:\n");
        for line in enhanced.lines() {
            out.push_str(&format!("│   {line}\n"));
        }
    }

    if !payload.actions.is_empty() {
        out.push_str("│\n│ Actions:\n");
        for (i, action) in payload.actions.iter().enumerate() {
            out.push_str(&format!("│   [a {}] {}", i + 1, action.title));
            if !action.command.is_empty() {
                out.push_str(&format!(" : `{}`", action.command));
            }
            out.push('\n');
        }
    }
    if !payload.resources.is_empty() {
        out.push_str("│\n│ Resources:\n");
        for (i, resource) in payload.resources.iter().enumerate() {
            out.push_str(&format!("│   [r {}] {} <{}>\n", i + 1, resource.title, resource.url));
        }
    }

    let mut commands = vec!["c capture"];
    if payload.can_enhance {
        commands.push("e enhance");
    }
    if payload.can_delete {
        commands.push("d delete");
    }
    commands.extend(["t toggle AI", "p print", "q quit"]);
    out.push_str(&format!(
        "│\n│ shortcut: {} | {}\n",
        payload.shortcut,
        commands.join(", ")
    ));
    out.push_str("└───────────────────────────────────────────\n");
    out
}

/// 표준 출력 팝업
#[derive(Debug, Default)]
pub struct ConsolePopup;

impl ConsolePopup {
    pub fn new() -> Self {
        Self
    }
}

impl PopupSink for ConsolePopup {
    fn update(&self, payload: &PopupPayload) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(render_payload(payload).as_bytes());
        let _ = stdout.flush();
    }

    fn hide(&self) {
        println!("(popup closed)");
    }
}
