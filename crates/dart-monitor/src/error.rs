//! 에러 타입 정의.

use std::path::PathBuf;

use dart_core::CoreError;
use dart_data::DataError;
use dart_notification::NotificationError;
use thiserror::Error;

/// 모니터 실행 에러.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// 설정/자격 증명 에러
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    /// 공시 조회 에러 (재시도 소진 포함)
    #[error("Data source error: {0}")]
    Data(#[from] DataError),

    /// 알림 전송기 생성 에러
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// 상태 파일 손상
    #[error("Corrupt state file {}: {source}", .path.display())]
    CorruptState {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// 파일 입출력 에러
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// 직렬화 에러
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MonitorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 오류 알림에 표시할 짧은 코드.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Data(e) if e.is_fatal() => "AUTH",
            Self::Data(_) => "FETCH",
            Self::Notification(_) => "NOTIFY",
            Self::CorruptState { .. } => "STATE",
            Self::Io { .. } | Self::Serialization(_) => "IO",
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, MonitorError>;
