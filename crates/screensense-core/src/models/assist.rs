//! AI 응답에서 추출한 assist 메타데이터.

use serde::{Deserialize, Serialize};

/// 응답 하나에서 유지하는 최대 액션/리소스 수
pub const MAX_ASSIST_ITEMS: usize = 5;

/// 사용자가 실행할 수 있는 제안 명령
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// 제목 (비어 있으면 `Action {n}`으로 채워짐)
    pub title: String,
    /// 복사할 명령 (빈 문자열 가능)
    #[serde(default)]
    pub command: String,
    /// 부가 설명 (빈 문자열 가능)
    #[serde(default)]
    pub notes: String,
}

/// 참고 링크 제안
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub reason: String,
}

/// 설명 본문과 분리된 assist 블록 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistMetadata {
    /// assist 블록을 제거한 설명 본문
    pub description: String,
    /// 제안 액션 (최대 5개)
    pub actions: Vec<Action>,
    /// 제안 리소스 (최대 5개)
    pub resources: Vec<Resource>,
}
