//! # screensense-storage
//!
//! 로컬 저장소 어댑터.
//! 스크린샷 폴더마다 `ai_results.json` 하나에 AI 결과 이력을 보관한다.

pub mod ai_result_store;
