//! 터미널 데스크톱 셸.
//!
//! 확인 대화상자를 번호 선택 프롬프트로 띄우고, 클립보드는 arboard,
//! 링크 열기는 webbrowser로 처리한다. 표준 입력은 콘솔 루프와 공유한다.

use async_trait::async_trait;
use screensense_core::error::CoreError;
use screensense_core::ports::desktop_shell::{ConfirmDialog, DesktopShell};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// 줄 채널 버퍼 크기
const LINE_BUFFER: usize = 16;

/// 콘솔 루프와 대화상자가 함께 쓰는 표준 입력 줄 리더
///
/// 블로킹 읽기는 전용 스레드에서 수행하고 채널로 넘긴다. 스레드는 런타임에 속하지
/// 않으므로 읽기 대기 중이어도 런타임 종료를 막지 않는다.
#[derive(Clone)]
pub struct SharedLines {
    rx: Arc<Mutex<mpsc::Receiver<std::io::Result<String>>>>,
}

impl SharedLines {
    pub fn stdin() -> Result<Self, CoreError> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// 임의의 줄 단위 입력으로 리더 생성
    pub fn from_reader<R>(reader: R) -> Result<Self, CoreError>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        std::thread::Builder::new()
            .name("screensense-stdin".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                debug!("입력 스레드 종료");
            })?;
        Ok(Self {
            rx: Arc::new(Mutex::new(rx)),
        })
    }

    /// 다음 줄 (EOF면 `None`)
    pub async fn next_line(&self) -> Result<Option<String>, CoreError> {
        match self.rx.lock().await.recv().await {
            Some(line) => Ok(Some(line?)),
            None => Ok(None),
        }
    }
}

/// 입력 문자열을 버튼 인덱스로 해석
///
/// 빈 입력은 기본 버튼, 범위 밖이나 숫자가 아닌 입력은 취소 버튼.
pub fn parse_choice(input: &str, dialog: &ConfirmDialog) -> usize {
    let input = input.trim();
    if input.is_empty() {
        return dialog.default_id;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=dialog.buttons.len()).contains(&n) => n - 1,
        _ => dialog.cancel_id,
    }
}

/// 대화상자 텍스트
pub fn render_dialog(dialog: &ConfirmDialog) -> String {
    let mut out = format!("\n== {} ==\n{}\n", dialog.title, dialog.message);
    if let Some(detail) = &dialog.detail {
        out.push_str(&format!("\n{detail}\n"));
    }
    out.push('\n');
    for (i, button) in dialog.buttons.iter().enumerate() {
        let marker = if i == dialog.default_id { "*" } else { " " };
        out.push_str(&format!("{marker}{}) {button}\n", i + 1));
    }
    out.push_str("> ");
    out
}

/// 터미널 셸: `DesktopShell` 포트 구현
pub struct TerminalShell {
    lines: SharedLines,
}

impl TerminalShell {
    pub fn new(lines: SharedLines) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl DesktopShell for TerminalShell {
    async fn confirm(&self, dialog: &ConfirmDialog) -> Result<Option<usize>, CoreError> {
        print!("{}", render_dialog(dialog));
        use std::io::Write;
        std::io::stdout().flush()?;

        let Some(line) = self.lines.next_line().await? else {
            return Ok(None);
        };
        Ok(Some(parse_choice(&line, dialog)))
    }

    async fn copy_text(&self, text: &str) -> Result<(), CoreError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| CoreError::Internal(format!("클립보드 열기 실패: {e}")))?;
            clipboard
                .set_text(text)
                .map_err(|e| CoreError::Internal(format!("클립보드 쓰기 실패: {e}")))
        })
        .await
        .map_err(|e| CoreError::Internal(format!("클립보드 작업 실패: {e}")))??;
        debug!("클립보드 복사 완료");
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<(), CoreError> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || webbrowser::open(&url))
            .await
            .map_err(|e| CoreError::Internal(format!("브라우저 작업 실패: {e}")))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog() -> ConfirmDialog {
        ConfirmDialog {
            title: "Open Suggested Resource".to_string(),
            message: "Docs".to_string(),
            detail: Some("https://docs.rs".to_string()),
            buttons: vec![
                "Open Link".to_string(),
                "Copy URL".to_string(),
                "Cancel".to_string(),
            ],
            default_id: 0,
            cancel_id: 2,
        }
    }

    #[tokio::test]
    async fn reader_yields_lines_then_eof() {
        let lines = SharedLines::from_reader(std::io::Cursor::new("c\na 2\n")).unwrap();
        let other = lines.clone();

        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("c"));
        assert_eq!(other.next_line().await.unwrap().as_deref(), Some("a 2"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    /// 입력이 올 때까지 영원히 막히는 리더
    struct StalledInput(std::sync::mpsc::Receiver<Vec<u8>>);

    impl std::io::Read for StalledInput {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.recv() {
                Ok(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Err(_) => Ok(0),
            }
        }
    }

    #[test]
    fn pending_read_does_not_block_runtime_shutdown() {
        let (_keep_open, rx) = std::sync::mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let lines =
                SharedLines::from_reader(std::io::BufReader::new(StalledInput(rx))).unwrap();
            let reader = lines.clone();
            tokio::spawn(async move { reader.next_line().await });

            let waited =
                tokio::time::timeout(std::time::Duration::from_millis(50), lines.next_line())
                    .await;
            assert!(waited.is_err());
        });

        // 읽기 스레드가 여전히 대기 중이어도 런타임은 곧바로 내려간다
        let started = std::time::Instant::now();
        drop(runtime);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn choice_parsing() {
        let d = dialog();
        assert_eq!(parse_choice("", &d), 0);
        assert_eq!(parse_choice(" 2 ", &d), 1);
        assert_eq!(parse_choice("3", &d), 2);
        assert_eq!(parse_choice("9", &d), 2);
        assert_eq!(parse_choice("0", &d), 2);
        assert_eq!(parse_choice("open", &d), 2);
    }

    #[test]
    fn dialog_lists_buttons_with_default_marker() {
        let text = render_dialog(&dialog());
        assert!(text.contains("== Open Suggested Resource =="));
        assert!(text.contains("https://docs.rs"));
        assert!(text.contains("*1) Open Link"));
        assert!(text.contains(" 3) Cancel"));
    }
}
