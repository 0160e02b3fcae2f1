//! OpenDart 공시 데이터 수집 및 분석.
//!
//! 이 crate는 다음을 제공합니다:
//! - OpenDart API 클라이언트 (페이지네이션, 호출 간격 제어, 재시도)
//! - 임원 소유상황보고서 제목 필터
//! - 공시 본문 기반 장내매수 탐지기

pub mod detector;
pub mod error;
pub mod filter;
pub mod provider;
pub mod retry;

pub use detector::PurchaseDetector;
pub use error::{DataError, Result};
pub use filter::TitleFilter;
pub use provider::{DisclosureSource, FilingDocument, OpenDartClient};
pub use retry::{retry, RetryPolicy};
