//! AI 결과 로그 포트.
//!
//! 구현: `screensense-storage` crate (JSON 배열 파일)

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::models::ai_log::LogEntry;

/// 스크린샷 폴더별 결과 로그
///
/// 단일 writer를 가정한다. 세션이 capture → describe → enhance를 직렬화한다.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// 같은 `file`이 있으면 얕은 병합, 없으면 추가 후 뒤쪽 `limit`개만 유지.
    /// 로그 파일 경로를 반환한다.
    async fn save(&self, folder: &Path, limit: usize, entry: &LogEntry)
        -> Result<PathBuf, CoreError>;

    /// `file_name` 항목 제거. 변경이 없으면 쓰지 않는다.
    async fn remove(&self, folder: &Path, file_name: &str) -> Result<PathBuf, CoreError>;

    /// 저장된 항목 목록 (디코딩 불가 항목은 건너뜀)
    async fn load(&self, folder: &Path) -> Result<Vec<LogEntry>, CoreError>;
}
