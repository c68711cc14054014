//! 대화상자, 클립보드, 브라우저 연동 포트.

use async_trait::async_trait;

use crate::error::CoreError;

/// 확인 대화상자 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub title: String,
    /// 본문 (액션/리소스 제목)
    pub message: String,
    /// 상세 (명령, 설명, URL)
    pub detail: Option<String>,
    pub buttons: Vec<String>,
    /// 기본 선택 버튼 인덱스
    pub default_id: usize,
    /// 취소로 간주할 버튼 인덱스
    pub cancel_id: usize,
}

/// 데스크톱 셸 연동
#[async_trait]
pub trait DesktopShell: Send + Sync {
    /// 대화상자 표시. 선택한 버튼 인덱스, 닫히면 `None`.
    async fn confirm(&self, dialog: &ConfirmDialog) -> Result<Option<usize>, CoreError>;

    /// 클립보드에 텍스트 복사
    async fn copy_text(&self, text: &str) -> Result<(), CoreError>;

    /// 기본 브라우저로 URL 열기
    async fn open_url(&self, url: &str) -> Result<(), CoreError>;
}
