//! 캡처 세션 상태 머신 통합 테스트.
//!
//! 캡처/설명 어댑터는 스크립트 가능한 가짜로, 결과 저장은 실제 JSON 저장소로 검증한다.

use async_trait::async_trait;
use parking_lot::Mutex;
use screensense_app::session::{CaptureSession, EnhanceOutcome, SessionError, SessionPorts};
use screensense_core::config::AppConfig;
use screensense_core::config_manager::ConfigManager;
use screensense_core::error::CoreError;
use screensense_core::models::assist::{Action, Resource};
use screensense_core::models::capture::{AiStatus, CapturedFile};
use screensense_core::models::popup::{PopupPayload, PopupStatus};
use screensense_core::ports::describer::{AiDescription, DescribeOptions, ScreenshotDescriber};
use screensense_core::ports::desktop_shell::{ConfirmDialog, DesktopShell};
use screensense_core::ports::notifier::DesktopNotifier;
use screensense_core::ports::popup::PopupSink;
use screensense_core::ports::result_store::ResultStore;
use screensense_core::ports::screen_capture::ScreenCapturer;
use screensense_storage::ai_result_store::JsonResultStore;
use screensense_suggestion::acknowledge::AckOutcome;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

type DescribeResult = Result<Option<AiDescription>, CoreError>;

// ============================================================
// 가짜 어댑터
// ============================================================

/// 폴더에 작은 파일을 쓰고 순번 이름을 돌려주는 캡처기
struct FakeCapturer {
    counter: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl ScreenCapturer for FakeCapturer {
    async fn capture(&self, folder: &Path) -> Result<CapturedFile, CoreError> {
        if self.fail {
            return Err(CoreError::NotFound {
                resource_type: "Monitor".to_string(),
                id: "primary".to_string(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        std::fs::create_dir_all(folder)?;
        let file_name = format!("Screenshot_{n}.png");
        let file_path = folder.join(&file_name);
        std::fs::write(&file_path, b"png")?;
        Ok(CapturedFile {
            file_name,
            file_path,
        })
    }
}

/// 초기 설명과 보강 요청에 각각 스크립트된 결과를 돌려주는 설명기
#[derive(Default)]
struct ScriptedDescriber {
    initial: Mutex<VecDeque<DescribeResult>>,
    enhanced: Mutex<VecDeque<DescribeResult>>,
    /// 설정되면 초기 설명 요청은 신호를 받을 때까지 대기
    initial_gate: Mutex<Option<Arc<Notify>>>,
    /// 설정되면 보강 요청은 신호를 받을 때까지 대기
    enhance_gate: Mutex<Option<Arc<Notify>>>,
    calls: AtomicUsize,
}

impl ScriptedDescriber {
    fn push_initial(&self, result: DescribeResult) {
        self.initial.lock().push_back(result);
    }

    fn push_enhanced(&self, result: DescribeResult) {
        self.enhanced.lock().push_back(result);
    }

    fn gate_initial(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.initial_gate.lock() = Some(gate.clone());
        gate
    }

    fn gate_enhance(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.enhance_gate.lock() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl ScreenshotDescriber for ScriptedDescriber {
    async fn describe(
        &self,
        _image_path: &Path,
        config: &AppConfig,
        options: &DescribeOptions,
    ) -> DescribeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !config.ai.enabled {
            return Ok(None);
        }
        if options.prompt_override.is_some() {
            let result = self.enhanced.lock().pop_front().unwrap_or(Ok(None));
            let gate = self.enhance_gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        } else {
            let result = self.initial.lock().pop_front().unwrap_or(Ok(None));
            let gate = self.initial_gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    bodies: Mutex<Vec<String>>,
}

#[async_trait]
impl DesktopNotifier for RecordingNotifier {
    async fn show_notification(&self, _title: &str, body: &str) -> Result<(), CoreError> {
        self.bodies.lock().push(body.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPopup {
    payloads: Mutex<Vec<PopupPayload>>,
    hidden: AtomicUsize,
}

impl RecordingPopup {
    fn last(&self) -> PopupPayload {
        self.payloads.lock().last().cloned().unwrap()
    }

    fn statuses(&self) -> Vec<Option<PopupStatus>> {
        self.payloads.lock().iter().map(|p| p.update.status).collect()
    }
}

impl PopupSink for RecordingPopup {
    fn update(&self, payload: &PopupPayload) {
        self.payloads.lock().push(payload.clone());
    }

    fn hide(&self) {
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
}

/// 항상 첫 버튼을 고르는 셸
#[derive(Default)]
struct AcceptingShell {
    copied: Mutex<Vec<String>>,
}

#[async_trait]
impl DesktopShell for AcceptingShell {
    async fn confirm(&self, _dialog: &ConfirmDialog) -> Result<Option<usize>, CoreError> {
        Ok(Some(0))
    }

    async fn copy_text(&self, text: &str) -> Result<(), CoreError> {
        self.copied.lock().push(text.to_string());
        Ok(())
    }

    async fn open_url(&self, _url: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

// ============================================================
// 조립
// ============================================================

struct Harness {
    _dir: tempfile::TempDir,
    folder: PathBuf,
    config: ConfigManager,
    describer: Arc<ScriptedDescriber>,
    notifier: Arc<RecordingNotifier>,
    popup: Arc<RecordingPopup>,
    shell: Arc<AcceptingShell>,
    store: Arc<JsonResultStore>,
    session: Arc<CaptureSession>,
}

fn harness_with(ai_enabled: bool, capture_fails: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("shots");
    let config = ConfigManager::with_path(dir.path().join("config.json")).unwrap();
    config
        .update_with(|c| {
            c.ai.enabled = ai_enabled;
            c.capture.screenshot_folder = folder.clone();
        })
        .unwrap();

    let describer = Arc::new(ScriptedDescriber::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let popup = Arc::new(RecordingPopup::default());
    let shell = Arc::new(AcceptingShell::default());
    let store = Arc::new(JsonResultStore::new());

    let ports = SessionPorts {
        capturer: Arc::new(FakeCapturer {
            counter: AtomicUsize::new(0),
            fail: capture_fails,
        }),
        describer: describer.clone(),
        store: store.clone(),
        notifier: notifier.clone(),
        popup: popup.clone(),
        shell: shell.clone(),
    };
    let session = Arc::new(CaptureSession::new(config.clone(), ports));

    Harness {
        _dir: dir,
        folder,
        config,
        describer,
        notifier,
        popup,
        shell,
        store,
        session,
    }
}

fn harness() -> Harness {
    harness_with(true, false)
}

fn description(text: &str, actions: usize, resources: usize) -> AiDescription {
    AiDescription {
        description: text.to_string(),
        actions: (1..=actions)
            .map(|i| Action {
                title: format!("Action {i}"),
                command: format!("echo {i}"),
                notes: String::new(),
            })
            .collect(),
        resources: (1..=resources)
            .map(|i| Resource {
                title: format!("Resource {i}"),
                url: format!("https://example.com/{i}"),
                reason: String::new(),
            })
            .collect(),
        model: "gpt-4o-mini-2024-07-18".to_string(),
        response_id: Some("resp_1".to_string()),
    }
}

async fn wait_until_enhancing(session: &CaptureSession) {
    for _ in 0..200 {
        if session.is_enhancing() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("보강이 시작되지 않음");
}

// ============================================================
// 캡처 + 초기 설명
// ============================================================

#[tokio::test]
async fn capture_with_description_completes_and_persists() {
    let h = harness();
    h.describer
        .push_initial(Ok(Some(description("An editor showing a build error.", 2, 1))));

    let record = h.session.handle_capture_trigger().await.unwrap().unwrap();

    assert_eq!(record.ai_status, AiStatus::Complete);
    assert_eq!(
        record.ai_description.as_deref(),
        Some("An editor showing a build error.")
    );
    assert_eq!(record.actions.len(), 2);
    assert_eq!(record.ai_model.as_deref(), Some("gpt-4o-mini-2024-07-18"));

    let entries = h.store.load(&h.folder).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file, record.file_name);
    assert_eq!(entries[0].response_id.as_deref(), Some("resp_1"));

    assert_eq!(
        h.popup.statuses(),
        vec![Some(PopupStatus::Captured), Some(PopupStatus::AiComplete)]
    );
    let last = h.popup.last();
    assert!(last.can_enhance);
    assert!(last.can_delete);

    let bodies = h.notifier.bodies.lock().clone();
    assert_eq!(bodies[0], "Screenshot captured!");
    assert!(bodies[1].starts_with("AI: An editor"));
}

#[tokio::test]
async fn disabled_ai_never_writes_log() {
    let h = harness_with(false, false);

    let record = h.session.handle_capture_trigger().await.unwrap().unwrap();

    assert_eq!(record.ai_status, AiStatus::Disabled);
    assert_eq!(h.describer.calls.load(Ordering::SeqCst), 0);
    assert!(!JsonResultStore::log_path(&h.folder).exists());
    assert!(!h.popup.last().can_enhance);
}

#[tokio::test]
async fn missing_description_is_skipped() {
    let h = harness();
    h.describer.push_initial(Ok(None));

    let record = h.session.handle_capture_trigger().await.unwrap().unwrap();

    assert_eq!(record.ai_status, AiStatus::Skipped);
    assert!(record.actions.is_empty());
    assert!(!JsonResultStore::log_path(&h.folder).exists());
    assert_eq!(h.popup.last().update.status, Some(PopupStatus::AiSkipped));
}

#[tokio::test]
async fn describe_failure_sets_error_status() {
    let h = harness();
    h.describer.push_initial(Err(CoreError::Provider {
        status: 500,
        message: "boom".to_string(),
    }));

    let record = h.session.handle_capture_trigger().await.unwrap().unwrap();

    assert_eq!(record.ai_status, AiStatus::Error);
    let last = h.popup.last();
    assert_eq!(last.update.status, Some(PopupStatus::AiError));
    assert!(last.update.error.unwrap().contains("boom"));
    assert!(!last.can_enhance);
}

#[tokio::test]
async fn capture_failure_notifies_and_keeps_no_record() {
    let h = harness_with(true, true);

    let err = h.session.handle_capture_trigger().await.unwrap_err();

    assert!(matches!(err, SessionError::Capture(_)));
    assert!(h.session.current_record().is_none());
    assert_eq!(
        h.notifier.bodies.lock().as_slice(),
        ["Failed to capture screenshot. Check logs for details."]
    );
}

#[tokio::test]
async fn new_capture_replaces_previous_record() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("first", 1, 1))));
    h.describer.push_initial(Ok(None));

    h.session.handle_capture_trigger().await.unwrap();
    let second = h.session.handle_capture_trigger().await.unwrap().unwrap();

    assert_eq!(second.file_name, "Screenshot_2.png");
    assert_eq!(second.ai_status, AiStatus::Skipped);
    assert!(second.ai_description.is_none());
    assert!(second.resources.is_empty());
}

// ============================================================
// 보강
// ============================================================

#[tokio::test]
async fn enhance_merges_and_keeps_primary_description() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("short", 2, 2))));
    h.describer.push_enhanced(Ok(Some(description("much deeper", 0, 3))));
    h.session.handle_capture_trigger().await.unwrap();

    let outcome = h.session.enhance().await.unwrap();

    assert_eq!(outcome, EnhanceOutcome::Enhanced);
    let record = h.session.current_record().unwrap();
    assert_eq!(record.ai_status, AiStatus::Enhanced);
    assert_eq!(record.ai_description.as_deref(), Some("short"));
    assert_eq!(record.ai_enhanced_description.as_deref(), Some("much deeper"));
    assert_eq!(record.actions.len(), 2);
    assert_eq!(record.resources.len(), 3);

    let entries = h.store.load(&h.folder).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].ai_description.as_deref(), Some("short"));
    assert_eq!(entries[0].ai_enhanced_description.as_deref(), Some("much deeper"));
    assert_eq!(entries[0].enhanced_actions.as_ref().map(Vec::len), Some(0));

    let last = h.popup.last();
    assert_eq!(last.update.status, Some(PopupStatus::AiEnhanced));
    assert!(last.can_enhance);
}

#[tokio::test]
async fn enhance_is_rejected_without_capture_or_when_disabled() {
    let h = harness();
    assert!(matches!(
        h.session.enhance().await,
        Err(SessionError::NoCapture)
    ));

    h.describer.push_initial(Ok(Some(description("text", 0, 0))));
    h.session.handle_capture_trigger().await.unwrap();
    h.session.set_ai_enabled(false).await.unwrap();

    assert!(matches!(
        h.session.enhance().await,
        Err(SessionError::AiDisabled)
    ));
    assert!(!h.config.get().ai.enabled);
}

#[tokio::test]
async fn enhance_on_skipped_record_is_rejected() {
    let h = harness();
    h.describer.push_initial(Ok(None));
    h.session.handle_capture_trigger().await.unwrap();

    let err = h.session.enhance().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::CannotEnhance {
            status: AiStatus::Skipped
        }
    ));
    assert!(!h.session.is_enhancing());
}

#[tokio::test]
async fn concurrent_enhance_is_rejected() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("text", 1, 1))));
    h.describer.push_enhanced(Ok(Some(description("deeper", 0, 0))));
    h.session.handle_capture_trigger().await.unwrap();

    let gate = h.describer.gate_enhance();
    let first = {
        let session = h.session.clone();
        tokio::spawn(async move { session.enhance().await })
    };
    wait_until_enhancing(&h.session).await;

    assert!(matches!(
        h.session.enhance().await,
        Err(SessionError::EnhanceInProgress)
    ));
    assert_eq!(h.session.current_record().unwrap().ai_status, AiStatus::Enhancing);
    assert!(!h.session.payload(Default::default()).can_enhance);

    gate.notify_one();
    assert_eq!(first.await.unwrap().unwrap(), EnhanceOutcome::Enhanced);
    assert!(!h.session.is_enhancing());
}

#[tokio::test]
async fn enhance_failure_reverts_status() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("text", 1, 0))));
    h.describer.push_enhanced(Err(CoreError::Network("timeout".to_string())));
    h.session.handle_capture_trigger().await.unwrap();

    let err = h.session.enhance().await.unwrap_err();

    assert!(matches!(err, SessionError::Describe(_)));
    let record = h.session.current_record().unwrap();
    assert_eq!(record.ai_status, AiStatus::Complete);
    assert!(record.ai_enhanced_description.is_none());
    assert_eq!(h.popup.last().update.status, Some(PopupStatus::AiError));
    assert!(h.popup.last().can_enhance);
}

#[tokio::test]
async fn empty_enhance_response_marks_enhanced_without_content() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("text", 0, 0))));
    h.describer.push_enhanced(Ok(None));
    h.session.handle_capture_trigger().await.unwrap();

    let outcome = h.session.enhance().await.unwrap();

    assert_eq!(outcome, EnhanceOutcome::NoNewContent);
    let record = h.session.current_record().unwrap();
    assert_eq!(record.ai_status, AiStatus::Enhanced);
    assert!(record.ai_enhanced_description.is_none());
}

#[tokio::test]
async fn stale_enhance_result_does_not_touch_new_capture() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("first", 1, 1))));
    h.describer.push_enhanced(Ok(Some(description("late enhancement", 0, 0))));
    h.describer.push_initial(Ok(Some(description("second", 0, 0))));
    h.session.handle_capture_trigger().await.unwrap();

    let gate = h.describer.gate_enhance();
    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.enhance().await })
    };
    wait_until_enhancing(&h.session).await;

    let second = h.session.handle_capture_trigger().await.unwrap().unwrap();
    assert_eq!(second.ai_status, AiStatus::Complete);

    gate.notify_one();
    pending.await.unwrap().unwrap();

    let record = h.session.current_record().unwrap();
    assert_eq!(record.file_name, "Screenshot_2.png");
    assert_eq!(record.ai_description.as_deref(), Some("second"));
    assert!(record.ai_enhanced_description.is_none());

    // 이전 캡처의 보강 결과도 로그에는 남는다
    let entries = h.store.load(&h.folder).await.unwrap();
    let first = entries.iter().find(|e| e.file == "Screenshot_1.png").unwrap();
    assert_eq!(
        first.ai_enhanced_description.as_deref(),
        Some("late enhancement")
    );
}

// ============================================================
// 삭제
// ============================================================

#[tokio::test]
async fn delete_removes_file_and_prunes_log() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("text", 0, 0))));
    let record = h.session.handle_capture_trigger().await.unwrap().unwrap();
    assert!(record.file_path.exists());

    let name = h.session.delete().await.unwrap();

    assert_eq!(name, record.file_name);
    assert!(!record.file_path.exists());
    assert!(h.session.current_record().is_none());
    assert!(h.store.load(&h.folder).await.unwrap().is_empty());
    assert_eq!(h.popup.hidden.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn delete_of_already_missing_file_succeeds() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("text", 0, 0))));
    let record = h.session.handle_capture_trigger().await.unwrap().unwrap();
    std::fs::remove_file(&record.file_path).unwrap();

    h.session.delete().await.unwrap();

    assert!(h.session.current_record().is_none());
    assert!(h.store.load(&h.folder).await.unwrap().is_empty());
    assert!(h
        .notifier
        .bodies
        .lock()
        .iter()
        .any(|b| b == "Screenshot deleted."));
}

#[tokio::test]
async fn enhance_finishing_after_delete_is_not_logged() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("first", 1, 1))));
    h.describer.push_enhanced(Ok(Some(description("late enhancement", 0, 0))));
    h.session.handle_capture_trigger().await.unwrap();

    let gate = h.describer.gate_enhance();
    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.enhance().await })
    };
    wait_until_enhancing(&h.session).await;

    h.session.delete().await.unwrap();
    assert!(h.store.load(&h.folder).await.unwrap().is_empty());

    gate.notify_one();
    assert_eq!(pending.await.unwrap().unwrap(), EnhanceOutcome::Discarded);

    assert!(h.session.current_record().is_none());
    assert!(h.store.load(&h.folder).await.unwrap().is_empty());
    assert!(!h.session.is_enhancing());
}

#[tokio::test]
async fn initial_description_finishing_after_delete_is_not_logged() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("too late", 1, 1))));

    let gate = h.describer.gate_initial();
    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.handle_capture_trigger().await })
    };
    for _ in 0..200 {
        if h.session.current_record().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    h.session.delete().await.unwrap();
    gate.notify_one();
    assert!(pending.await.unwrap().unwrap().is_none());

    assert!(h.store.load(&h.folder).await.unwrap().is_empty());
    assert!(!h
        .notifier
        .bodies
        .lock()
        .iter()
        .any(|b| b.starts_with("AI: ")));
}

#[tokio::test]
async fn stale_capture_still_logs_after_newer_capture_is_deleted() {
    let h = harness();
    h.describer.push_initial(Ok(Some(description("first", 0, 0))));
    h.describer.push_enhanced(Ok(Some(description("late enhancement", 0, 0))));
    h.describer.push_initial(Ok(Some(description("second", 0, 0))));
    h.session.handle_capture_trigger().await.unwrap();

    let gate = h.describer.gate_enhance();
    let pending = {
        let session = h.session.clone();
        tokio::spawn(async move { session.enhance().await })
    };
    wait_until_enhancing(&h.session).await;

    // 새 캡처를 지우더라도 이전 캡처 파일의 보강 결과는 남는다
    h.session.handle_capture_trigger().await.unwrap();
    h.session.delete().await.unwrap();
    gate.notify_one();
    assert_eq!(pending.await.unwrap().unwrap(), EnhanceOutcome::Enhanced);

    let entries = h.store.load(&h.folder).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file, "Screenshot_1.png");
    assert_eq!(
        entries[0].ai_enhanced_description.as_deref(),
        Some("late enhancement")
    );
}

#[tokio::test]
async fn delete_without_capture_is_rejected() {
    let h = harness();
    assert!(matches!(
        h.session.delete().await,
        Err(SessionError::NoCapture)
    ));
}

// ============================================================
// 토글 / 단축키 / 제안 처리
// ============================================================

#[tokio::test]
async fn toggle_ai_persists_to_config_file() {
    let h = harness();

    assert!(!h.session.toggle_ai().await.unwrap());

    let saved = std::fs::read_to_string(h.config.config_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["ai"]["enabled"], false);
    assert!(h.session.toggle_ai().await.unwrap());
}

#[tokio::test]
async fn disabled_notifications_are_suppressed() {
    let h = harness_with(false, false);
    h.config.update_with(|c| c.notification.enabled = false).unwrap();

    h.session.handle_capture_trigger().await.unwrap();

    assert!(h.notifier.bodies.lock().is_empty());
}

#[tokio::test]
async fn shortcut_display_prefers_registered() {
    let h = harness();
    assert_eq!(h.session.shortcut_display(), "Ctrl+Shift+S");

    h.session.set_registered_shortcut(Some("Ctrl+Alt+S".to_string()));
    assert_eq!(h.session.shortcut_display(), "Ctrl+Alt+S");
}

#[tokio::test]
async fn action_request_copies_command() {
    let h = harness();

    let outcome = h
        .session
        .run_action(&serde_json::json!({"title": "Build", "command": "cargo build"}))
        .await;

    assert_eq!(outcome, AckOutcome::Copied);
    assert_eq!(h.shell.copied.lock().as_slice(), ["cargo build"]);

    let rejected = h.session.open_resource(&serde_json::json!({"title": "x"})).await;
    assert!(!rejected.is_ok());
}
