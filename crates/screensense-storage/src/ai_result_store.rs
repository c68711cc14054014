//! AI 결과 로그 저장소.
//!
//! 파일당 한 항목을 유지하는 JSON 배열. 같은 `file` 키로 다시 저장하면 기존 객체 위에
//! 새 필드를 얕게 덮어쓰고, 한도를 넘으면 앞쪽(오래된) 항목부터 버린다.
//! 쓰기는 임시 파일 + rename으로 원자적으로 교체한다.

use async_trait::async_trait;
use screensense_core::error::CoreError;
use screensense_core::models::ai_log::{LogEntry, AI_LOG_FILE_NAME, DEFAULT_LOG_LIMIT};
use screensense_core::ports::result_store::ResultStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// JSON 배열 파일 기반 결과 로그
#[derive(Debug, Default, Clone)]
pub struct JsonResultStore;

impl JsonResultStore {
    pub fn new() -> Self {
        Self
    }

    /// 폴더의 로그 파일 경로
    pub fn log_path(folder: &Path) -> PathBuf {
        folder.join(AI_LOG_FILE_NAME)
    }

    /// 기존 배열 로드
    ///
    /// 파일이 없으면 빈 배열. JSON이 깨졌거나 배열이 아니면 경고 후 빈 배열.
    /// 그 외 읽기 오류는 전파한다.
    async fn load_raw(path: &Path) -> Result<Vec<Value>, CoreError> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => {
                warn!(path = %path.display(), "AI 로그가 배열이 아님, 빈 로그로 취급");
                Ok(Vec::new())
            }
            Err(e) => {
                warn!(path = %path.display(), "AI 로그 파싱 실패, 빈 로그로 취급: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn write_atomic(path: &Path, items: &[Value]) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(items)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    fn same_file(item: &Value, file: &str) -> bool {
        item.get("file").and_then(Value::as_str) == Some(file)
    }
}

#[async_trait]
impl ResultStore for JsonResultStore {
    async fn save(
        &self,
        folder: &Path,
        limit: usize,
        entry: &LogEntry,
    ) -> Result<PathBuf, CoreError> {
        let limit = if limit == 0 { DEFAULT_LOG_LIMIT } else { limit };
        let path = Self::log_path(folder);
        fs::create_dir_all(folder).await?;

        let mut items = Self::load_raw(&path).await?;
        let Value::Object(fields) = serde_json::to_value(entry)? else {
            return Err(CoreError::Internal("로그 항목이 객체가 아님".to_string()));
        };

        match items
            .iter_mut()
            .find(|item| Self::same_file(item, &entry.file))
        {
            Some(Value::Object(existing)) => existing.extend(fields),
            _ => items.push(Value::Object(fields)),
        }

        if items.len() > limit {
            let excess = items.len() - limit;
            items.drain(..excess);
        }

        Self::write_atomic(&path, &items).await?;
        debug!(file = %entry.file, count = items.len(), "AI 로그 저장");
        Ok(path)
    }

    async fn remove(&self, folder: &Path, file_name: &str) -> Result<PathBuf, CoreError> {
        let path = Self::log_path(folder);
        let items = Self::load_raw(&path).await?;
        let before = items.len();

        let filtered: Vec<Value> = items
            .into_iter()
            .filter(|item| !Self::same_file(item, file_name))
            .collect();

        if filtered.len() == before {
            return Ok(path);
        }

        Self::write_atomic(&path, &filtered).await?;
        debug!(file = %file_name, removed = before - filtered.len(), "AI 로그 항목 제거");
        Ok(path)
    }

    async fn load(&self, folder: &Path) -> Result<Vec<LogEntry>, CoreError> {
        let path = Self::log_path(folder);
        let items = Self::load_raw(&path).await?;

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<LogEntry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("디코딩 불가 로그 항목 건너뜀: {e}");
                    None
                }
            })
            .collect())
    }
}
