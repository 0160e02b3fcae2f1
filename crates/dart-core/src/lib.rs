//! # Dart Core
//!
//! OpenDart 임원 장내매수 모니터의 핵심 도메인 모델 및 공통 인프라.
//!
//! 이 크레이트는 모니터 전반에서 사용되는 기본 타입을 제공합니다:
//! - 공시(Filing) 및 매수 이벤트(PurchaseEvent)
//! - 조회 기간(DateWindow)과 KST 시간 유틸리티
//! - 설정 관리 (설정 파일 + 환경 변수)
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
