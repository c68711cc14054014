//! 애플리케이션 설정 구조체.
//!
//! AI 제공자, 캡처 폴더/단축키, 결과 로그 한도, 이미지 압축, 알림 설정을 정의한다.
//! 모든 필드에 serde 기본값이 있으므로 일부만 적힌 설정 파일도 기본값 위에 병합된다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 내장 기본 모델 (OpenAI)
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// 내장 기본 모델 (Anthropic)
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";

/// 설정에 프롬프트가 없을 때 사용하는 내장 프롬프트
pub const BUILTIN_PROMPT: &str =
    "Describe the key elements of this screenshot in one sentence, including notable UI, text, and context.";

/// 최대 출력 토큰 내장 기본값
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 200;

/// 단축키 설정이 비어 있을 때의 후보
pub const DEFAULT_SHORTCUTS: [&str; 2] = ["Ctrl+Shift+S", "Ctrl+Alt+S"];

/// 업로드 JPEG 기본 품질 (0은 미설정으로 취급)
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// AI 설명 설정
    #[serde(default)]
    pub ai: AiConfig,
    /// 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 결과 로그 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 업로드 전 이미지 압축 설정
    #[serde(default)]
    pub image_compression: ImageCompressionConfig,
    /// 데스크톱 알림 설정
    #[serde(default)]
    pub notification: NotificationConfig,
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }
}

// ============================================================
// AI 설정
// ============================================================

/// AI API 제공자 타입: 요청/응답 형식과 인증 헤더를 결정한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderType {
    /// OpenAI Responses API: `Authorization: Bearer` + `/v1/responses`
    #[default]
    OpenAi,
    /// Anthropic Messages API: `x-api-key` + `/v1/messages`
    Anthropic,
}

impl AiProviderType {
    /// 제공자별 기본 엔드포인트
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            AiProviderType::OpenAi => "https://api.openai.com/v1/responses",
            AiProviderType::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    /// 제공자별 내장 기본 모델
    pub fn default_model(&self) -> &'static str {
        match self {
            AiProviderType::OpenAi => DEFAULT_OPENAI_MODEL,
            AiProviderType::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }
}

/// AI 설명 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// AI 설명 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 제공자 타입
    #[serde(default)]
    pub provider_type: AiProviderType,
    /// 엔드포인트 URL 오버라이드 (None이면 제공자 기본값)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// 모델 이름 (None이면 제공자 내장 기본값)
    #[serde(default = "default_ai_model")]
    pub model: Option<String>,
    /// 설명 프롬프트 (None이면 내장 한 문장 프롬프트)
    #[serde(default = "default_ai_prompt")]
    pub prompt: Option<String>,
    /// 보강(enhance) 프롬프트
    #[serde(default = "default_enhance_prompt")]
    pub enhance_prompt: String,
    /// 최대 출력 토큰 (None이면 내장 기본값 200)
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// API 키를 읽을 환경 변수 이름
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider_type: AiProviderType::default(),
            endpoint: None,
            model: default_ai_model(),
            prompt: default_ai_prompt(),
            enhance_prompt: default_enhance_prompt(),
            max_output_tokens: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl AiConfig {
    /// 실제 호출할 엔드포인트
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| self.provider_type.default_endpoint().to_string())
    }
}

// ============================================================
// 캡처 설정
// ============================================================

/// 캡처 단축키: 단일 문자열 또는 후보 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptureShortcut {
    /// 단일 단축키
    One(String),
    /// 순서대로 등록을 시도할 후보 목록
    Many(Vec<String>),
}

impl Default for CaptureShortcut {
    fn default() -> Self {
        CaptureShortcut::Many(DEFAULT_SHORTCUTS.iter().map(|s| s.to_string()).collect())
    }
}

impl CaptureShortcut {
    /// 등록 후보 목록 (공백 제거, 빈 값 제외, 비어 있으면 기본 후보)
    pub fn candidates(&self) -> Vec<String> {
        let configured: Vec<String> = match self {
            CaptureShortcut::One(s) => vec![s.trim().to_string()],
            CaptureShortcut::Many(list) => list.iter().map(|s| s.trim().to_string()).collect(),
        }
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();

        if configured.is_empty() {
            DEFAULT_SHORTCUTS.iter().map(|s| s.to_string()).collect()
        } else {
            configured
        }
    }
}

/// 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 스크린샷 저장 폴더 (결과 로그도 이 폴더에 위치)
    #[serde(default = "default_screenshot_folder")]
    pub screenshot_folder: PathBuf,
    /// 캡처 단축키
    #[serde(default)]
    pub shortcut: CaptureShortcut,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            screenshot_folder: default_screenshot_folder(),
            shortcut: CaptureShortcut::default(),
        }
    }
}

// ============================================================
// 저장소 / 이미지 압축 / 알림 설정
// ============================================================

/// 결과 로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 보관할 최대 로그 항목 수
    #[serde(default = "default_log_limit")]
    pub log_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_limit: default_log_limit(),
        }
    }
}

/// 업로드 전 이미지 압축 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCompressionConfig {
    /// 압축 활성화 여부 (false면 원본 바이트 전송)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 최대 너비 (픽셀)
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// JPEG 품질 (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for ImageCompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_width: default_max_width(),
            quality: default_quality(),
        }
    }
}

/// 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 데스크톱 알림 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_ai_model() -> Option<String> {
    Some(DEFAULT_OPENAI_MODEL.to_string())
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_log_limit() -> usize {
    100
}

fn default_max_width() -> u32 {
    1920
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_screenshot_folder() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(|p| p.join("ScreenSense")))
        .unwrap_or_else(|| PathBuf::from("./screenshots"))
}

fn default_ai_prompt() -> Option<String> {
    Some(
        "Study this screenshot and provide actionable insight in Markdown with the following sections:\n\n\
**Category**: Classify the overall context in ONE word (Work, Code, Communication, Planning, Entertainment, Browser, Other).\n\n\
**What I'm Doing**: Summarize the user's current task or intent in 2 short sentences. Mention if they appear to be blocked.\n\n\
**Key Evidence**:\n- Highlight 2-3 important UI elements, files, or messages that justify the assessment.\n- Quote any critical text verbatim when useful.\n\n\
**Immediate Suggestions**:\n- List concrete next steps or quick fixes the user can try now.\n- Include links or commands only if they are visible in the screenshot.\n\n\
**Longer-Term Ideas**:\n- Provide improvement ideas, optimizations, or learning resources relevant to the task.\n\n\
If code is visible, include a fenced code block with the most relevant snippet.\n\n\
Finish with a fenced ```assist code block containing JSON like {\"actions\":[{\"title\":\"Run tests\",\"command\":\"npm test\",\"notes\":\"Copy then run manually.\"}],\"resources\":[{\"title\":\"Docs\",\"url\":\"https://example.com\",\"reason\":\"Reference for the tool in use.\"}]}. Omit properties that would otherwise be empty."
            .to_string(),
    )
}

fn default_enhance_prompt() -> String {
    "Deliver a deep-dive review of this screenshot in Markdown:\n\n\
## Situation Overview\n- Describe the end-to-end workflow in progress and why the user is doing it.\n- Identify blockers, risks, or decision points.\n\n\
## Diagnosis\n- Break down root causes behind any issues, citing on-screen evidence.\n- Map UI elements to their purpose and any related data/variables.\n\n\
## Recommendations\n- Give step-by-step remedies or improvements, starting with the quickest win.\n- Suggest tooling, references, or examples that match what is shown.\n\n\
## Optimization & Learning\n- Offer process refinements, automation ideas, or best practices.\n- Share resources (docs, tutorials, patterns) that would help the user advance.\n\n\
## Reference Snippets\n- Extract the most informative code or command snippets with short explanations.\n\n\
Close with a fenced ```assist code block containing JSON describing any follow-up {\"actions\":[...],\"resources\":[...]}. Remind the user in each note that manual confirmation is required before executing."
        .to_string()
}
