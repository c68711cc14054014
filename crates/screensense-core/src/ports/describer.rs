//! AI 스크린샷 설명 포트.
//!
//! 구현: `screensense-network` crate (reqwest: OpenAI / Anthropic)

use async_trait::async_trait;
use std::path::Path;

use crate::config::AppConfig;
use crate::error::CoreError;
use crate::models::assist::{Action, Resource};

/// 호출별 오버라이드 (설정값보다 우선)
#[derive(Debug, Clone, Default)]
pub struct DescribeOptions {
    pub prompt_override: Option<String>,
    pub model_override: Option<String>,
    pub max_output_tokens: Option<u32>,
}

impl DescribeOptions {
    /// 프롬프트만 바꾼 호출 (보강 요청용)
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt_override: Some(prompt.into()),
            ..Default::default()
        }
    }
}

/// AI 설명 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiDescription {
    /// assist 블록을 제거한 설명
    pub description: String,
    pub actions: Vec<Action>,
    pub resources: Vec<Resource>,
    /// 제공자가 응답한 모델 ID (요청 모델과 다를 수 있음)
    pub model: String,
    pub response_id: Option<String>,
}

/// 스크린샷 설명자
#[async_trait]
pub trait ScreenshotDescriber: Send + Sync {
    /// AI가 비활성화되었거나 API 키가 없으면 `Ok(None)`.
    /// 네트워크/제공자 오류는 `Err`로 전파한다.
    async fn describe(
        &self,
        image_path: &Path,
        config: &AppConfig,
        options: &DescribeOptions,
    ) -> Result<Option<AiDescription>, CoreError>;
}
