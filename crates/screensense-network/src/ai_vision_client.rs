//! 외부 AI 비전 클라이언트.
//!
//! 스크린샷 한 장을 AI 제공자에 보내 설명을 받는다.
//! 설정과 API 키는 호출마다 새로 읽으므로 설정 리로드가 다음 호출부터 반영된다.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use screensense_core::config::{AiProviderType, AppConfig, BUILTIN_PROMPT, DEFAULT_MAX_OUTPUT_TOKENS};
use screensense_core::error::CoreError;
use screensense_core::ports::describer::{AiDescription, DescribeOptions, ScreenshotDescriber};
use screensense_core::ports::image_preprocessor::{ImagePreprocessor, PreparedImage};
use screensense_suggestion::extractor::extract_assist_metadata;

/// 텍스트 세그먼트가 하나도 없을 때의 설명
pub const NO_DESCRIPTION_SENTINEL: &str = "AI returned no description.";

/// Anthropic API 버전 헤더 값
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// 오류 응답 본문 로그 최대 길이
const ERROR_BODY_PREVIEW: usize = 200;

// ============================================================
// 요청 파라미터 해석
// ============================================================

/// 호출 하나에 사용할 최종 파라미터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub prompt: String,
    pub model: String,
    pub max_output_tokens: u32,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// 오버라이드 > 설정 > 내장 기본값 순서로 해석
pub fn resolve_request(config: &AppConfig, options: &DescribeOptions) -> ResolvedRequest {
    let ai = &config.ai;
    let prompt = non_empty(options.prompt_override.as_deref())
        .or_else(|| non_empty(ai.prompt.as_deref()))
        .unwrap_or(BUILTIN_PROMPT);
    let model = non_empty(options.model_override.as_deref())
        .or_else(|| non_empty(ai.model.as_deref()))
        .unwrap_or(ai.provider_type.default_model());
    let max_output_tokens = options
        .max_output_tokens
        .filter(|t| *t > 0)
        .or(ai.max_output_tokens.filter(|t| *t > 0))
        .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);

    ResolvedRequest {
        prompt: prompt.to_string(),
        model: model.to_string(),
        max_output_tokens,
    }
}

// ============================================================
// 제공자별 요청/응답 형식
// ============================================================

/// OpenAI Responses API 요청 본문
fn openai_request_body(request: &ResolvedRequest, image: &PreparedImage, encoded: &str) -> Value {
    json!({
        "model": request.model,
        "input": [{
            "role": "user",
            "content": [
                { "type": "input_text", "text": request.prompt },
                {
                    "type": "input_image",
                    "image_url": format!("data:{};base64,{}", image.media_type, encoded)
                }
            ]
        }],
        "max_output_tokens": request.max_output_tokens
    })
}

/// Anthropic Messages API 요청 본문
fn anthropic_request_body(request: &ResolvedRequest, image: &PreparedImage, encoded: &str) -> Value {
    json!({
        "model": request.model,
        "max_tokens": request.max_output_tokens,
        "messages": [{
            "role": "user",
            "content": [
                {
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": image.media_type,
                        "data": encoded
                    }
                },
                { "type": "text", "text": request.prompt }
            ]
        }]
    })
}

fn push_segment(parts: &mut Vec<String>, segment: &Value, text_type: &str) {
    if segment.get("type").and_then(Value::as_str) != Some(text_type) {
        return;
    }
    if let Some(text) = segment.get("text").and_then(Value::as_str) {
        if !text.is_empty() {
            parts.push(text.trim().to_string());
        }
    }
}

/// 응답의 텍스트 세그먼트를 공백으로 연결 (없으면 sentinel)
///
/// OpenAI: `output[].content[]`의 `output_text`, Anthropic: `content[]`의 `text`.
pub fn collect_response_text(provider: AiProviderType, response: &Value) -> String {
    let mut parts = Vec::new();

    match provider {
        AiProviderType::OpenAi => {
            for item in response
                .get("output")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                for segment in item
                    .get("content")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    push_segment(&mut parts, segment, "output_text");
                }
            }
        }
        AiProviderType::Anthropic => {
            for segment in response
                .get("content")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                push_segment(&mut parts, segment, "text");
            }
        }
    }

    let joined = parts.join(" ");
    let joined = joined.trim();
    if joined.is_empty() {
        NO_DESCRIPTION_SENTINEL.to_string()
    } else {
        joined.to_string()
    }
}

// ============================================================
// RemoteVisionClient
// ============================================================

/// 외부 AI 비전 API 클라이언트
///
/// 지원 API:
/// - OpenAI Responses: `POST /v1/responses` + `input_image` data URL
/// - Anthropic Messages: `POST /v1/messages` + base64 image block
///
/// API 키는 설정의 `api_key_env` 환경 변수에서 매 호출 읽는다.
pub struct RemoteVisionClient {
    http_client: reqwest::Client,
    preprocessor: Arc<dyn ImagePreprocessor>,
}

impl RemoteVisionClient {
    /// 새 클라이언트 생성. 요청 타임아웃은 두지 않는다.
    pub fn new(preprocessor: Arc<dyn ImagePreprocessor>) -> Result<Self, CoreError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            http_client,
            preprocessor,
        })
    }

    async fn prepare_image(&self, path: &Path, config: &AppConfig) -> Result<PreparedImage, CoreError> {
        let preprocessor = Arc::clone(&self.preprocessor);
        let path = path.to_path_buf();
        let compression = config.image_compression.clone();

        tokio::task::spawn_blocking(move || preprocessor.prepare(&path, &compression))
            .await
            .map_err(|e| CoreError::Internal(format!("이미지 전처리 작업 실패: {}", e)))?
    }

    async fn send(
        &self,
        config: &AppConfig,
        api_key: &str,
        body: &Value,
    ) -> Result<Value, CoreError> {
        let endpoint = config.ai.resolved_endpoint();
        let mut builder = self
            .http_client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(body);

        builder = match config.ai.provider_type {
            AiProviderType::Anthropic => builder
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            AiProviderType::OpenAi => builder.header("Authorization", format!("Bearer {}", api_key)),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("AI API 호출 실패: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("AI API 응답 읽기 실패: {}", e)))?;

        if !status.is_success() {
            warn!(status = %status, endpoint = %endpoint, "AI API 오류 응답");
            return Err(CoreError::Provider {
                status: status.as_u16(),
                message: text.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ScreenshotDescriber for RemoteVisionClient {
    async fn describe(
        &self,
        image_path: &Path,
        config: &AppConfig,
        options: &DescribeOptions,
    ) -> Result<Option<AiDescription>, CoreError> {
        if !config.ai.enabled {
            info!("AI 비활성화, 설명 생략");
            return Ok(None);
        }

        let key_env = &config.ai.api_key_env;
        let api_key = match std::env::var(key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                warn!(env = %key_env, "AI 활성화 상태지만 API 키 환경 변수가 없음, 설명 생략");
                return Ok(None);
            }
        };

        let image = self.prepare_image(image_path, config).await?;
        let encoded = B64.encode(&image.bytes);
        let request = resolve_request(config, options);

        let body = match config.ai.provider_type {
            AiProviderType::OpenAi => openai_request_body(&request, &image, &encoded),
            AiProviderType::Anthropic => anthropic_request_body(&request, &image, &encoded),
        };

        debug!(
            model = %request.model,
            max_output_tokens = request.max_output_tokens,
            image_size = image.bytes.len(),
            media_type = %image.media_type,
            "AI 비전 API 호출"
        );

        let response = self.send(config, &api_key, &body).await?;
        let raw_text = collect_response_text(config.ai.provider_type, &response);
        let metadata = extract_assist_metadata(&raw_text);

        info!(
            actions = metadata.actions.len(),
            resources = metadata.resources.len(),
            "AI 응답 수신"
        );

        Ok(Some(AiDescription {
            description: metadata.description,
            actions: metadata.actions,
            resources: metadata.resources,
            model: response
                .get("model")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(request.model),
            response_id: response.get("id").and_then(Value::as_str).map(str::to_string),
        }))
    }
}

// ============================================================
// 테스트
// ============================================================
