//! 캡처 세션 컨트롤러.
//!
//! 메모리의 최신 캡처 레코드 하나와 두 개의 진행 중 플래그(캡처, 보강)를 소유한다.
//! 캡처 → 초기 설명 → 결과 로그 저장, 사용자 요청 보강, 삭제 흐름을 조율하고
//! 상태가 바뀔 때마다 팝업 페이로드를 다시 투영한다.
//!
//! 세대(generation) 카운터는 캡처와 삭제 때마다 증가한다. 비동기 AI 호출은 시작 시점의
//! 세대가 여전히 현재일 때만 메모리 레코드에 결과를 반영한다.

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use screensense_core::config::AppConfig;
use screensense_core::config_manager::ConfigManager;
use screensense_core::error::CoreError;
use screensense_core::models::ai_log::LogEntry;
use screensense_core::models::assist::{Action, Resource};
use screensense_core::models::capture::{AiStatus, CaptureRecord};
use screensense_core::models::popup::{PopupPayload, PopupStatus, PopupUpdate};
use screensense_core::ports::describer::{AiDescription, DescribeOptions, ScreenshotDescriber};
use screensense_core::ports::desktop_shell::DesktopShell;
use screensense_core::ports::notifier::DesktopNotifier;
use screensense_core::ports::popup::PopupSink;
use screensense_core::ports::result_store::ResultStore;
use screensense_core::ports::screen_capture::ScreenCapturer;
use screensense_suggestion::acknowledge::{self, AckOutcome};
use screensense_suggestion::presenter::{build_payload, iso_timestamp, shortcut_display, SessionFlags};

/// 알림 제목
const NOTIFICATION_TITLE: &str = "ScreenSense";

/// 세션 레벨 에러
#[derive(Debug, Error)]
pub enum SessionError {
    /// 메모리에 캡처가 없음
    #[error("캡처 없음")]
    NoCapture,

    #[error("AI 비활성화 상태")]
    AiDisabled,

    /// 보강 요청이 이미 진행 중
    #[error("보강 요청 진행 중")]
    EnhanceInProgress,

    /// 현재 상태에서는 보강 불가 (complete/enhanced만 허용)
    #[error("보강 불가 상태: {status}")]
    CannotEnhance { status: AiStatus },

    #[error("캡처 실패: {0}")]
    Capture(#[source] CoreError),

    #[error("AI 설명 실패: {0}")]
    Describe(#[source] CoreError),

    #[error("스크린샷 삭제 실패: {0}")]
    Delete(#[source] CoreError),

    #[error("설정 저장 실패: {0}")]
    Config(#[source] CoreError),
}

/// 보강 요청 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceOutcome {
    /// 보강 설명 반영
    Enhanced,
    /// 응답은 성공했지만 새 설명이 없음 (상태만 enhanced)
    NoNewContent,
    /// 응답 도착 전에 스크린샷이 삭제되어 결과를 버림
    Discarded,
}

/// 세션이 사용하는 어댑터 묶음
#[derive(Clone)]
pub struct SessionPorts {
    pub capturer: Arc<dyn ScreenCapturer>,
    pub describer: Arc<dyn ScreenshotDescriber>,
    pub store: Arc<dyn ResultStore>,
    pub notifier: Arc<dyn DesktopNotifier>,
    pub popup: Arc<dyn PopupSink>,
    pub shell: Arc<dyn DesktopShell>,
}

/// 진행 중 플래그: 스코프를 벗어나면 모든 경로에서 해제된다.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 보강 시작 시점의 레코드 스냅샷
struct EnhanceTicket {
    generation: u64,
    previous_status: AiStatus,
    file_name: String,
    file_path: PathBuf,
    timestamp: String,
    ai_description: Option<String>,
    actions: Vec<Action>,
    resources: Vec<Resource>,
}

/// 캡처 세션 컨트롤러
pub struct CaptureSession {
    config: ConfigManager,
    ports: SessionPorts,
    record: Mutex<Option<CaptureRecord>>,
    capture_in_progress: AtomicBool,
    enhance_in_progress: AtomicBool,
    generation: AtomicU64,
    /// 삭제된 스크린샷 경로. 늦게 도착한 AI 결과가 로그에 다시 쓰이지 않게 한다.
    deleted: Mutex<HashSet<PathBuf>>,
    registered_shortcut: Mutex<Option<String>>,
}

impl CaptureSession {
    pub fn new(config: ConfigManager, ports: SessionPorts) -> Self {
        Self {
            config,
            ports,
            record: Mutex::new(None),
            capture_in_progress: AtomicBool::new(false),
            enhance_in_progress: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            deleted: Mutex::new(HashSet::new()),
            registered_shortcut: Mutex::new(None),
        }
    }

    /// 현재 레코드 복제본
    pub fn current_record(&self) -> Option<CaptureRecord> {
        self.record.lock().clone()
    }

    pub fn is_enhancing(&self) -> bool {
        self.enhance_in_progress.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    // ============================================================
    // 캡처 + 초기 설명
    // ============================================================

    /// 캡처 트리거 처리
    ///
    /// 이미 캡처가 진행 중이면 경고만 남기고 `Ok(None)`. 초기 설명 실패는 에러가 아니라
    /// 레코드 상태(`error`)와 팝업으로 드러난다. 반환값은 흐름 종료 시점의 레코드.
    pub async fn handle_capture_trigger(&self) -> Result<Option<CaptureRecord>, SessionError> {
        let Some(_guard) = InFlightGuard::acquire(&self.capture_in_progress) else {
            warn!("캡처 진행 중, 트리거 무시");
            return Ok(None);
        };

        let config = self.config.get();
        let captured = match self
            .ports
            .capturer
            .capture(&config.capture.screenshot_folder)
            .await
        {
            Ok(captured) => captured,
            Err(e) => {
                error!("스크린샷 캡처 실패: {e}");
                self.notify("Failed to capture screenshot. Check logs for details.")
                    .await;
                return Err(SessionError::Capture(e));
            }
        };

        let ai_enabled = config.ai.enabled;
        let record = CaptureRecord::new(captured, Utc::now(), ai_enabled);
        let file_path = record.file_path.clone();
        self.deleted.lock().remove(&file_path);
        let generation = {
            let mut slot = self.record.lock();
            *slot = Some(record.clone());
            self.generation.fetch_add(1, Ordering::AcqRel) + 1
        };

        info!(path = %file_path.display(), "스크린샷 캡처");
        self.notify("Screenshot captured!").await;
        self.refresh_popup(PopupUpdate::new(
            PopupStatus::Captured,
            if ai_enabled {
                "Screenshot captured. Running AI analysis..."
            } else {
                "Screenshot captured."
            },
        ));

        if ai_enabled {
            self.run_initial_describe(generation, &record).await;
        }

        Ok(self.current_record())
    }

    async fn run_initial_describe(&self, generation: u64, record: &CaptureRecord) {
        // 단계 사이 설정 리로드를 반영하기 위해 새 스냅샷 사용
        let config = self.config.get();
        let result = self
            .ports
            .describer
            .describe(&record.file_path, &config, &DescribeOptions::default())
            .await;

        match result {
            Ok(Some(ai)) if !ai.description.is_empty() => {
                if self.was_deleted(&record.file_path) {
                    info!(file = %record.file_name, "삭제된 스크린샷의 AI 결과, 저장 생략");
                    return;
                }
                self.apply_if_current(generation, |r| {
                    r.ai_status = AiStatus::Complete;
                    r.ai_description = Some(ai.description.clone());
                    r.ai_model = Some(ai.model.clone());
                    r.ai_response_id = ai.response_id.clone();
                    r.actions = ai.actions.clone();
                    r.resources = ai.resources.clone();
                });

                let entry = LogEntry {
                    ai_description: Some(ai.description.clone()),
                    timestamp: Some(iso_timestamp(record.timestamp)),
                    model: Some(ai.model.clone()),
                    response_id: ai.response_id.clone(),
                    actions: Some(ai.actions.clone()),
                    resources: Some(ai.resources.clone()),
                    ..LogEntry::new(&record.file_name)
                };
                let mut message = "AI summary ready.".to_string();
                if let Err(e) = self.persist(&config, &record.file_path, &entry).await {
                    error!(file = %record.file_name, "AI 결과 저장 실패: {e}");
                    message = format!("AI summary ready. Failed to save AI log: {e}");
                }

                self.notify(&format!("AI: {}", ai.description)).await;
                if self.is_current(generation) {
                    self.refresh_popup(PopupUpdate::new(PopupStatus::AiComplete, message));
                }
            }
            Ok(_) => {
                let applied = self.apply_if_current(generation, |r| {
                    r.ai_status = AiStatus::Skipped;
                    r.actions.clear();
                    r.resources.clear();
                });
                if applied {
                    self.refresh_popup(PopupUpdate::new(
                        PopupStatus::AiSkipped,
                        "AI description unavailable. Check API key configuration.",
                    ));
                }
            }
            Err(e) => {
                error!(file = %record.file_name, "AI 분석 실패: {e}");
                let applied = self.apply_if_current(generation, |r| {
                    r.ai_status = AiStatus::Error;
                    r.actions.clear();
                    r.resources.clear();
                });
                self.notify("AI analysis failed. Check logs for details.")
                    .await;
                if applied {
                    self.refresh_popup(
                        PopupUpdate::new(
                            PopupStatus::AiError,
                            "AI analysis failed. Check logs for details.",
                        )
                        .with_error(e.to_string()),
                    );
                }
            }
        }
    }

    // ============================================================
    // 보강
    // ============================================================

    /// 보강 요청
    ///
    /// 레코드 없음 → AI 비활성 → 진행 중 → 상태 순서로 검사한다.
    /// 실패하면 상태를 진입 직전 값으로 되돌린다.
    pub async fn enhance(&self) -> Result<EnhanceOutcome, SessionError> {
        let config = self.config.get();

        let (guard, ticket) = {
            let mut slot = self.record.lock();
            let record = slot.as_mut().ok_or(SessionError::NoCapture)?;
            if !config.ai.enabled {
                return Err(SessionError::AiDisabled);
            }
            let guard = InFlightGuard::acquire(&self.enhance_in_progress)
                .ok_or(SessionError::EnhanceInProgress)?;
            if !record.ai_status.allows_enhance() {
                return Err(SessionError::CannotEnhance {
                    status: record.ai_status,
                });
            }

            let ticket = EnhanceTicket {
                generation: self.generation.load(Ordering::Acquire),
                previous_status: record.ai_status,
                file_name: record.file_name.clone(),
                file_path: record.file_path.clone(),
                timestamp: iso_timestamp(record.timestamp),
                ai_description: record.ai_description.clone(),
                actions: record.actions.clone(),
                resources: record.resources.clone(),
            };
            record.ai_status = AiStatus::Enhancing;
            (guard, ticket)
        };

        self.refresh_popup(PopupUpdate::new(
            PopupStatus::Enhancing,
            "Requesting enhanced description...",
        ));

        let config = self.config.get();
        let options = DescribeOptions::with_prompt(config.ai.enhance_prompt.clone());
        let result = self
            .ports
            .describer
            .describe(&ticket.file_path, &config, &options)
            .await;

        match result {
            Ok(Some(ai)) if !ai.description.is_empty() => {
                if self.was_deleted(&ticket.file_path) {
                    info!(file = %ticket.file_name, "삭제된 스크린샷의 보강 결과, 저장 생략");
                    return Ok(EnhanceOutcome::Discarded);
                }
                let (actions, resources) = merge_enhanced_lists(&ticket, &ai);
                let applied = self.apply_if_current(ticket.generation, |r| {
                    r.ai_status = AiStatus::Enhanced;
                    r.ai_enhanced_description = Some(ai.description.clone());
                    r.ai_model = Some(ai.model.clone());
                    r.ai_response_id = ai.response_id.clone();
                    r.actions = actions.clone();
                    r.resources = resources.clone();
                });

                let entry = LogEntry {
                    ai_description: ticket.ai_description.clone(),
                    ai_enhanced_description: Some(ai.description.clone()),
                    timestamp: Some(ticket.timestamp.clone()),
                    model: Some(ai.model.clone()),
                    response_id: ai.response_id.clone(),
                    actions: Some(actions),
                    resources: Some(resources),
                    enhanced_actions: Some(ai.actions.clone()),
                    enhanced_resources: Some(ai.resources.clone()),
                    ..LogEntry::new(&ticket.file_name)
                };
                let mut message = "Enhanced description ready.".to_string();
                if let Err(e) = self.persist(&config, &ticket.file_path, &entry).await {
                    error!(file = %ticket.file_name, "보강 결과 저장 실패: {e}");
                    message = format!("Enhanced description ready. Failed to save AI log: {e}");
                }

                drop(guard);
                if applied {
                    self.refresh_popup(PopupUpdate::new(PopupStatus::AiEnhanced, message));
                }
                self.notify("AI enhancement ready.").await;
                Ok(EnhanceOutcome::Enhanced)
            }
            Ok(_) => {
                let applied = self.apply_if_current(ticket.generation, |r| {
                    r.ai_status = AiStatus::Enhanced;
                });
                drop(guard);
                if applied {
                    self.refresh_popup(PopupUpdate::new(
                        PopupStatus::AiEnhanced,
                        "AI enhancement returned no additional details.",
                    ));
                }
                Ok(EnhanceOutcome::NoNewContent)
            }
            Err(e) => {
                error!(file = %ticket.file_name, "AI 보강 실패: {e}");
                let applied = self.apply_if_current(ticket.generation, |r| {
                    r.ai_status = ticket.previous_status;
                });
                drop(guard);
                if applied {
                    self.refresh_popup(
                        PopupUpdate::new(
                            PopupStatus::AiError,
                            "AI enhancement failed. Check logs for details.",
                        )
                        .with_error(e.to_string()),
                    );
                }
                self.notify("AI enhancement failed. Check logs for details.")
                    .await;
                Err(SessionError::Describe(e))
            }
        }
    }

    // ============================================================
    // 삭제
    // ============================================================

    /// 현재 스크린샷 삭제. 이미 없는 파일은 성공으로 취급한다.
    ///
    /// 로그 정리 실패는 경고만 남긴다. 삭제된 파일 이름을 반환한다.
    pub async fn delete(&self) -> Result<String, SessionError> {
        let (generation, record) = {
            let slot = self.record.lock();
            let record = slot.clone().ok_or(SessionError::NoCapture)?;
            (self.generation.load(Ordering::Acquire), record)
        };

        self.deleted.lock().insert(record.file_path.clone());
        if let Err(e) = tokio::fs::remove_file(&record.file_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                self.deleted.lock().remove(&record.file_path);
                let err = CoreError::from(e);
                error!(path = %record.file_path.display(), "스크린샷 삭제 실패: {err}");
                self.refresh_popup(
                    PopupUpdate::new(
                        PopupStatus::DeleteError,
                        "Failed to delete screenshot. Check logs for details.",
                    )
                    .with_error(err.to_string()),
                );
                return Err(SessionError::Delete(err));
            }
            info!(path = %record.file_path.display(), "스크린샷 파일이 이미 없음");
        }

        let folder = self.log_folder(&self.config.get(), &record.file_path);
        if let Err(e) = self.ports.store.remove(&folder, &record.file_name).await {
            warn!(file = %record.file_name, "삭제된 스크린샷의 AI 로그 정리 실패: {e}");
        }

        {
            let mut slot = self.record.lock();
            if self.generation.load(Ordering::Acquire) == generation {
                *slot = None;
                self.generation.fetch_add(1, Ordering::AcqRel);
            }
        }

        info!(file = %record.file_name, "스크린샷 삭제");
        self.notify("Screenshot deleted.").await;
        self.ports.popup.hide();
        Ok(record.file_name)
    }

    // ============================================================
    // AI 토글 / 설정 / 단축키
    // ============================================================

    /// AI 활성화 여부 변경 후 설정 파일에 저장
    pub async fn set_ai_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.config
            .update_with(|c| c.ai.enabled = enabled)
            .map_err(SessionError::Config)?;

        info!(enabled, "AI 설명 토글");
        self.notify(if enabled {
            "AI descriptions enabled."
        } else {
            "AI descriptions disabled."
        })
        .await;

        if self.record.lock().is_some() {
            self.refresh_popup(PopupUpdate::default());
        }
        Ok(())
    }

    /// AI 활성화 여부 반전, 새 값 반환
    pub async fn toggle_ai(&self) -> Result<bool, SessionError> {
        let enabled = !self.config.get().ai.enabled;
        self.set_ai_enabled(enabled).await?;
        Ok(enabled)
    }

    /// 설정 리로드 후 호출: 레코드가 있으면 팝업 재투영
    pub fn on_config_reloaded(&self) {
        if self.record.lock().is_some() {
            self.refresh_popup(PopupUpdate::default());
        }
    }

    /// 외부에서 실제 등록에 성공한 단축키 기록
    pub fn set_registered_shortcut(&self, shortcut: Option<String>) {
        *self.registered_shortcut.lock() = shortcut;
    }

    pub fn shortcut_display(&self) -> String {
        let candidates = self.config.get().capture.shortcut.candidates();
        shortcut_display(self.registered_shortcut.lock().as_deref(), &candidates)
    }

    // ============================================================
    // 팝업 / 사용자 제안 처리
    // ============================================================

    /// 현재 상태의 팝업 페이로드
    pub fn payload(&self, update: PopupUpdate) -> PopupPayload {
        let flags = SessionFlags {
            ai_enabled: self.config.get().ai.enabled,
            enhance_in_progress: self.is_enhancing(),
        };
        let shortcut = self.shortcut_display();
        let slot = self.record.lock();
        build_payload(slot.as_ref(), flags, &shortcut, update, Utc::now())
    }

    pub fn refresh_popup(&self, update: PopupUpdate) {
        let payload = self.payload(update);
        self.ports.popup.update(&payload);
    }

    /// UI의 액션 요청 처리 (신뢰하지 않는 JSON)
    pub async fn run_action(&self, raw: &Value) -> AckOutcome {
        acknowledge::acknowledge_action(self.ports.shell.as_ref(), raw).await
    }

    /// UI의 리소스 열기 요청 처리
    pub async fn open_resource(&self, raw: &Value) -> AckOutcome {
        acknowledge::open_resource(self.ports.shell.as_ref(), raw).await
    }

    // ============================================================
    // 내부 도우미
    // ============================================================

    fn was_deleted(&self, file_path: &Path) -> bool {
        self.deleted.lock().contains(file_path)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// 세대가 현재이고 레코드가 있으면 변경 적용
    fn apply_if_current<F>(&self, generation: u64, apply: F) -> bool
    where
        F: FnOnce(&mut CaptureRecord),
    {
        let mut slot = self.record.lock();
        if !self.is_current(generation) {
            info!(generation, "이전 캡처의 AI 결과, 메모리 반영 생략");
            return false;
        }
        match slot.as_mut() {
            Some(record) => {
                apply(record);
                true
            }
            None => false,
        }
    }

    /// 로그 폴더: 스크린샷 파일이 있는 폴더 (없으면 설정 폴더)
    fn log_folder(&self, config: &AppConfig, file_path: &Path) -> PathBuf {
        file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.capture.screenshot_folder.clone())
    }

    async fn persist(
        &self,
        config: &AppConfig,
        file_path: &Path,
        entry: &LogEntry,
    ) -> Result<PathBuf, CoreError> {
        let folder = self.log_folder(config, file_path);
        let path = self
            .ports
            .store
            .save(&folder, config.storage.log_limit, entry)
            .await?;
        info!(path = %path.display(), "AI 결과 저장");
        Ok(path)
    }

    async fn notify(&self, body: &str) {
        if !self.config.get().notification.enabled {
            return;
        }
        if let Err(e) = self
            .ports
            .notifier
            .show_notification(NOTIFICATION_TITLE, body)
            .await
        {
            warn!("알림 표시 실패: {e}");
        }
    }
}

/// 보강 결과가 비어 있지 않은 목록만 교체
fn merge_enhanced_lists(ticket: &EnhanceTicket, ai: &AiDescription) -> (Vec<Action>, Vec<Resource>) {
    let actions = if ai.actions.is_empty() {
        ticket.actions.clone()
    } else {
        ai.actions.clone()
    };
    let resources = if ai.resources.is_empty() {
        ticket.resources.clone()
    } else {
        ai.resources.clone()
    };
    (actions, resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = InFlightGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());

        drop(first);
        assert!(!flag.load(Ordering::Acquire));
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn empty_enhance_lists_keep_previous() {
        let ticket = EnhanceTicket {
            generation: 1,
            previous_status: AiStatus::Complete,
            file_name: "a.png".to_string(),
            file_path: PathBuf::from("/tmp/a.png"),
            timestamp: String::new(),
            ai_description: Some("d".to_string()),
            actions: vec![Action {
                title: "old".to_string(),
                ..Default::default()
            }],
            resources: vec![Resource {
                title: "old".to_string(),
                url: "https://old.example".to_string(),
                reason: String::new(),
            }],
        };
        let ai = AiDescription {
            description: "deeper".to_string(),
            actions: vec![],
            resources: vec![Resource {
                title: "new".to_string(),
                url: "https://new.example".to_string(),
                reason: String::new(),
            }],
            model: "m".to_string(),
            response_id: None,
        };

        let (actions, resources) = merge_enhanced_lists(&ticket, &ai);
        assert_eq!(actions[0].title, "old");
        assert_eq!(resources[0].title, "new");
    }
}
