//! OpenDart 임원 장내매수 모니터.
//!
//! 이 crate는 스케줄러가 주기적으로 실행하는 단일 실행 바이너리를 제공합니다:
//! - 공시 목록 조회 → 제목 필터 → 중복 제거 → 본문 탐지 → 텔레그램 알림
//! - 알림 완료 접수번호 영속화 (JSON 상태 파일)
//! - 실행 결과 요약 로그 및 JSON 결과 파일

pub mod error;
pub mod report;
pub mod run;
pub mod store;

pub use error::{MonitorError, Result};
pub use report::{RunCounts, RunReport, RunStatus};
pub use run::{Monitor, RunOptions};
pub use store::SeenStore;
