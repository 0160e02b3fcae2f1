//! 공시 데이터 제공자.
//!
//! - `opendart`: 금융감독원 OpenDart API (공시 목록, 공시 본문)

pub mod opendart;

use async_trait::async_trait;
use dart_core::{DateWindow, Filing};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use opendart::OpenDartClient;

/// 공시 본문 (텍스트 블록 목록).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingDocument {
    /// 접수번호
    pub receipt_no: String,
    /// 본문 블록 (제공처 응답 순서)
    pub blocks: Vec<String>,
}

impl FilingDocument {
    pub fn new(receipt_no: impl Into<String>, blocks: Vec<String>) -> Self {
        Self {
            receipt_no: receipt_no.into(),
            blocks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.trim().is_empty())
    }
}

/// 공시 조회 소스.
///
/// 모니터 실행기는 이 트레이트에만 의존하므로 테스트에서는 고정 응답을
/// 돌려주는 구현으로 대체할 수 있습니다.
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    /// 기간 내 접수된 공시를 모든 페이지에 걸쳐 조회합니다.
    ///
    /// 결과는 접수번호 기준으로 중복이 제거되어 있어야 합니다.
    async fn fetch_filings(&self, window: &DateWindow) -> Result<Vec<Filing>>;

    /// 단일 공시의 본문을 조회합니다.
    async fn fetch_document(&self, receipt_no: &str) -> Result<FilingDocument>;

    /// 소스 이름 (로그용).
    fn name(&self) -> &str;
}
