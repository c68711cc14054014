//! # screensense-network
//!
//! AI 비전 API 네트워크 어댑터.
//! 스크린샷을 전처리해 base64로 업로드하고, 응답의 텍스트 세그먼트를 모아
//! assist 추출기에 넘긴다. OpenAI Responses API와 Anthropic Messages API를 지원한다.

pub mod ai_vision_client;
