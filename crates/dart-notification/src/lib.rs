//! # Dart Notification
//!
//! 임원 장내매수 알림 서비스.
//!
//! 지원 채널:
//! - Telegram (Bot API `sendMessage`, HTML 파싱 모드)

pub mod telegram;
pub mod types;

pub use telegram::*;
pub use types::*;
