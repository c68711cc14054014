//! # screensense
//!
//! ScreenSense 바이너리 진입점.
//! 어댑터 생성과 DI 와이어링, 설정 감시 태스크, 콘솔 명령 루프를 담당한다.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use screensense_app::config_watcher::{ConfigWatcher, DEFAULT_POLL_INTERVAL};
use screensense_app::console;
use screensense_app::console_popup::ConsolePopup;
use screensense_app::notifier::DesktopNotifierImpl;
use screensense_app::session::{CaptureSession, SessionPorts};
use screensense_app::terminal_shell::{SharedLines, TerminalShell};
use screensense_core::config_manager::ConfigManager;
use screensense_core::ports::result_store::ResultStore;
use screensense_network::ai_vision_client::RemoteVisionClient;
use screensense_storage::ai_result_store::JsonResultStore;
use screensense_vision::capture::XcapScreenCapturer;
use screensense_vision::preprocessor::JpegPreprocessor;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// ScreenSense 스크린샷 AI 도우미
#[derive(Parser, Debug)]
#[command(name = "screensense")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// 콘솔 팝업 모드로 실행 (기본)
    Run,
    /// 한 번 캡처하고 종료
    Capture {
        /// 초기 설명 후 보강 설명까지 요청
        #[arg(long)]
        enhance: bool,
    },
    /// 저장된 AI 결과 이력 출력
    History {
        /// 최근 항목 수
        #[arg(long, short = 'n', default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "screensense={lvl},screensense_app={lvl},screensense_core={lvl},screensense_vision={lvl},screensense_network={lvl},screensense_storage={lvl},screensense_suggestion={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("설정 로드 실패")?;
    info!(path = %config.config_path().display(), "설정 로드 완료");

    match args.command.clone().unwrap_or(Command::Run) {
        Command::Run => run_console(config).await,
        Command::Capture { enhance } => run_once(config, enhance).await,
        Command::History { limit } => print_history(&config, limit).await,
    }
}

/// 어댑터 생성 및 세션 조립
fn build_session(config: ConfigManager, lines: SharedLines) -> Result<Arc<CaptureSession>> {
    let preprocessor = Arc::new(JpegPreprocessor::new());
    let describer =
        Arc::new(RemoteVisionClient::new(preprocessor).context("AI 클라이언트 생성 실패")?);

    let ports = SessionPorts {
        capturer: Arc::new(XcapScreenCapturer::new()),
        describer,
        store: Arc::new(JsonResultStore::new()),
        notifier: Arc::new(DesktopNotifierImpl::new()),
        popup: Arc::new(ConsolePopup::new()),
        shell: Arc::new(TerminalShell::new(lines)),
    };
    Ok(Arc::new(CaptureSession::new(config, ports)))
}

async fn run_console(config: ConfigManager) -> Result<()> {
    let lines = SharedLines::stdin().context("표준 입력 리더 생성 실패")?;
    let session = build_session(config.clone(), lines.clone())?;

    // 콘솔 모드는 전역 단축키를 등록하지 않는다
    let candidates = config.get().capture.shortcut.candidates();
    info!(?candidates, "캡처 단축키 후보");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let watcher = ConfigWatcher::new(config, DEFAULT_POLL_INTERVAL);
    let reload_session = session.clone();
    let watcher_task = tokio::spawn(watcher.run(shutdown_rx, move |_| {
        reload_session.on_config_reloaded();
    }));

    let result = tokio::select! {
        res = console::run(session.clone(), lines) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C 수신");
            Ok(())
        }
    };

    let _ = shutdown_tx.send(true);
    if let Err(e) = watcher_task.await {
        warn!("설정 감시 태스크 종료 실패: {e}");
    }
    info!("ScreenSense 종료");
    result
}

async fn run_once(config: ConfigManager, enhance: bool) -> Result<()> {
    let lines = SharedLines::stdin().context("표준 입력 리더 생성 실패")?;
    let session = build_session(config, lines)?;

    let Some(record) = session.handle_capture_trigger().await? else {
        return Ok(());
    };
    println!("{} [{}]", record.file_path.display(), record.ai_status);

    if enhance && record.ai_status.allows_enhance() {
        let outcome = session.enhance().await?;
        info!(?outcome, "보강 완료");
    }
    Ok(())
}

async fn print_history(config: &ConfigManager, limit: usize) -> Result<()> {
    let folder = config.get().capture.screenshot_folder;
    let entries = JsonResultStore::new()
        .load(&folder)
        .await
        .with_context(|| format!("AI 결과 로드 실패: {}", folder.display()))?;

    if entries.is_empty() {
        println!("no AI results in {}", folder.display());
        return Ok(());
    }

    let skip = entries.len().saturating_sub(limit);
    for entry in entries.iter().skip(skip) {
        println!(
            "{}  {}  ({})",
            entry.timestamp.as_deref().unwrap_or("-"),
            entry.file,
            entry.model.as_deref().unwrap_or("unknown model")
        );
        let text = entry
            .ai_enhanced_description
            .as_deref()
            .or(entry.ai_description.as_deref())
            .unwrap_or("");
        for line in text.lines().filter(|l| !l.trim().is_empty()).take(3) {
            println!("    {line}");
        }
    }
    Ok(())
}
