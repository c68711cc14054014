//! assist 블록 추출기.
//!
//! AI 응답 마크다운에서 ```` ```assist ```` 블록(없으면 ```` ```json ```` 블록)을 찾아
//! 설명 본문과 구조화된 액션/리소스를 분리한다.
//! 순수 함수이며 어떤 입력에도 실패하지 않는다.

use screensense_core::models::assist::{Action, AssistMetadata, Resource, MAX_ASSIST_ITEMS};
use serde_json::Value;

const FENCE: &str = "```";

/// 응답 텍스트에서 설명과 assist 메타데이터 분리
///
/// 블록이 없으면 전체 텍스트(trim)가 설명이 된다.
/// 블록 내용이 JSON 객체가 아니면 빈 객체로 취급한다.
pub fn extract_assist_metadata(markdown: &str) -> AssistMetadata {
    let Some(block) = find_fenced_block(markdown, "assist").or_else(|| find_fenced_block(markdown, "json"))
    else {
        return AssistMetadata {
            description: markdown.trim().to_string(),
            actions: Vec::new(),
            resources: Vec::new(),
        };
    };

    let metadata: Value = serde_json::from_str(block.body).unwrap_or(Value::Null);

    let mut cleaned = String::with_capacity(markdown.len());
    cleaned.push_str(&markdown[..block.start]);
    cleaned.push_str(&markdown[block.end..]);

    let actions = list_field(&metadata, "actions")
        .iter()
        .enumerate()
        .filter_map(|(i, item)| normalize_action(item, i))
        .take(MAX_ASSIST_ITEMS)
        .collect();

    let resources = list_field(&metadata, "resources")
        .iter()
        .enumerate()
        .filter_map(|(i, item)| normalize_resource(item, i))
        .take(MAX_ASSIST_ITEMS)
        .collect();

    AssistMetadata {
        description: cleaned.trim().to_string(),
        actions,
        resources,
    }
}

/// 원본 텍스트 안의 블록 위치
struct FencedBlock<'a> {
    /// 여는 펜스 시작 (바이트)
    start: usize,
    /// 닫는 펜스 끝 (바이트)
    end: usize,
    /// 태그 뒤 공백을 건너뛴 내용
    body: &'a str,
}

/// `` ```{tag} `` 로 시작하는 첫 블록 (태그는 대소문자 무시)
///
/// 여는 펜스 뒤 가장 가까운 `` ``` ``에서 닫힌다.
fn find_fenced_block<'a>(text: &'a str, tag: &str) -> Option<FencedBlock<'a>> {
    let opener = format!("{FENCE}{tag}");
    let start = find_ignore_ascii_case(text, &opener)?;
    let after_tag = start + opener.len();

    let rest = &text[after_tag..];
    let body_offset = rest.len() - rest.trim_start().len();
    let body_start = after_tag + body_offset;

    let close = text[body_start..].find(FENCE)?;
    Some(FencedBlock {
        start,
        end: body_start + close + FENCE.len(),
        body: &text[body_start..body_start + close],
    })
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

fn list_field<'a>(metadata: &'a Value, key: &str) -> &'a [Value] {
    metadata
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn trimmed_str(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// 객체가 아니거나 제목과 명령이 모두 비면 버린다. `index`는 원본 목록 기준 위치.
fn normalize_action(item: &Value, index: usize) -> Option<Action> {
    if !item.is_object() {
        return None;
    }
    let title = trimmed_str(item, "title");
    let command = trimmed_str(item, "command");
    let notes = trimmed_str(item, "notes");

    if title.is_empty() && command.is_empty() {
        return None;
    }

    Some(Action {
        title: if title.is_empty() {
            format!("Action {}", index + 1)
        } else {
            title
        },
        command,
        notes,
    })
}

fn normalize_resource(item: &Value, index: usize) -> Option<Resource> {
    if !item.is_object() {
        return None;
    }
    let title = trimmed_str(item, "title");
    let url = trimmed_str(item, "url");
    let reason = trimmed_str(item, "reason");

    if title.is_empty() && url.is_empty() && reason.is_empty() {
        return None;
    }

    Some(Resource {
        title: if title.is_empty() {
            format!("Resource {}", index + 1)
        } else {
            title
        },
        url,
        reason,
    })
}
