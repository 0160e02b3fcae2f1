//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dart_core::PurchaseEvent;
use serde::{Deserialize, Serialize};

/// 알림 우선순위 레벨.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// 일반 우선순위
    #[default]
    Normal,
    /// 높은 우선순위 (매수 탐지)
    High,
    /// 긴급 우선순위 (시스템 오류)
    Critical,
}

/// 알림 이벤트 타입.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// 임원 장내매수 탐지
    PurchaseDetected { purchase: Box<PurchaseEvent> },
    /// 모니터링 완료 (탐지 결과 요약)
    RunCompleted {
        window: String,
        filings_checked: usize,
        purchases: usize,
    },
    /// 실행 시작 확인
    Startup { window: String },
    /// 시스템 오류
    SystemError { error_code: String, message: String },
}

/// 알림 메시지.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 고유 알림 ID
    pub id: String,
    /// 알림 이벤트
    pub event: NotificationEvent,
    /// 우선순위 레벨
    pub priority: NotificationPriority,
    /// 타임스탬프
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// 새 알림을 생성합니다.
    pub fn new(event: NotificationEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            priority: NotificationPriority::Normal,
            timestamp: Utc::now(),
        }
    }

    /// 매수 탐지 알림.
    pub fn purchase(purchase: PurchaseEvent) -> Self {
        Self::new(NotificationEvent::PurchaseDetected {
            purchase: Box::new(purchase),
        })
        .with_priority(NotificationPriority::High)
    }

    /// 시스템 오류 알림.
    pub fn system_error(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationEvent::SystemError {
            error_code: error_code.into(),
            message: message.into(),
        })
        .with_priority(NotificationPriority::Critical)
    }

    /// 우선순위 레벨을 설정합니다.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// 매수 탐지 알림이면 접수번호를 반환합니다.
    pub fn receipt_no(&self) -> Option<&str> {
        match &self.event {
            NotificationEvent::PurchaseDetected { purchase } => Some(purchase.receipt_no()),
            _ => None,
        }
    }
}

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 알림을 전송합니다.
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    /// 전송기가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let notification = Notification::system_error("E001", "boom");
        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(json["event"]["type"], "system_error");
        assert_eq!(json["priority"], "critical");
        assert!(notification.receipt_no().is_none());
    }
}
