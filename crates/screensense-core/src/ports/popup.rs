//! 팝업 UI 포트.
//!
//! 코어는 페이로드만 만들고 렌더링은 어댑터가 맡는다.

use crate::models::popup::PopupPayload;

/// 팝업 렌더러
pub trait PopupSink: Send + Sync {
    /// 새 페이로드 표시 (호출 순서대로 반영)
    fn update(&self, payload: &PopupPayload);

    /// 팝업 숨김
    fn hide(&self);
}
