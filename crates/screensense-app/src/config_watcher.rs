//! 설정 파일 감시.
//!
//! 주기적으로 `config.json`의 수정 시각과 크기를 비교해 바뀌면 다시 로드한다.
//! 파싱 실패 시 기존 설정을 유지하고 경고만 남긴다.

use screensense_core::config::AppConfig;
use screensense_core::config_manager::ConfigManager;
use screensense_core::error::CoreError;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// 기본 감시 주기
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// 파일 변경 판단 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

/// 설정 파일 감시자
pub struct ConfigWatcher {
    config: ConfigManager,
    interval: Duration,
    last_seen: Option<Fingerprint>,
}

impl ConfigWatcher {
    pub fn new(config: ConfigManager, interval: Duration) -> Self {
        let last_seen = fingerprint(&config);
        Self {
            config,
            interval,
            last_seen,
        }
    }

    /// 한 번 검사. 변경이 없으면 `None`, 있으면 리로드 결과.
    pub fn poll_once(&mut self) -> Option<Result<AppConfig, CoreError>> {
        let current = fingerprint(&self.config);
        if current == self.last_seen {
            return None;
        }
        self.last_seen = current;

        if current.is_none() {
            // 삭제된 파일은 다시 생길 때까지 기존 설정 유지
            warn!(path = %self.config.config_path().display(), "설정 파일 없음");
            return None;
        }
        debug!(path = %self.config.config_path().display(), "설정 파일 변경 감지");
        Some(self.config.reload())
    }

    /// 종료 신호까지 감시 루프 실행
    ///
    /// 리로드에 성공할 때마다 `on_reload`를 호출한다.
    pub async fn run<F>(mut self, mut shutdown_rx: tokio::sync::watch::Receiver<bool>, on_reload: F)
    where
        F: Fn(&AppConfig) + Send,
    {
        info!(
            path = %self.config.config_path().display(),
            interval_ms = self.interval.as_millis() as u64,
            "설정 파일 감시 시작"
        );
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.poll_once() {
                        Some(Ok(config)) => on_reload(&config),
                        Some(Err(e)) => warn!("설정 다시 로드 실패, 기존 설정 유지: {e}"),
                        None => {}
                    }
                }
                _ = shutdown_rx.changed() => {
                    debug!("설정 파일 감시 종료");
                    break;
                }
            }
        }
    }
}

fn fingerprint(config: &ConfigManager) -> Option<Fingerprint> {
    let meta = std::fs::metadata(config.config_path()).ok()?;
    Some(Fingerprint {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}
