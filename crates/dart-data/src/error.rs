//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 공시 데이터 수집 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 서버 일시 장애 (HTTP 5xx, 시스템 점검)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// 요청 한도 초과 (HTTP 429, DART 020)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// 인증키 오류 (DART 010/011/012/901)
    #[error("Unauthorized [{status}]: {message}")]
    Unauthorized { status: String, message: String },

    /// 기타 DART 상태 코드 오류
    #[error("API error [{status}]: {message}")]
    Api { status: String, message: String },

    /// 재시도 대상이 아닌 HTTP 오류 (4xx)
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 탐지 패턴 컴파일 오류
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl DataError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DataError::Network(_)
                | DataError::Timeout(_)
                | DataError::Unavailable(_)
                | DataError::RateLimited(_)
        )
    }

    /// 재시도해도 소용없는 치명적 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DataError::Unauthorized { .. })
    }

    /// DART 응답 상태 코드를 에러로 변환합니다.
    ///
    /// `000`(정상)과 `013`(조회 데이터 없음)은 에러가 아니므로 `None`을 반환합니다.
    pub fn from_dart_status(status: &str, message: &str) -> Option<Self> {
        let status_owned = status.to_string();
        let message_owned = message.to_string();
        match status {
            "000" | "013" => None,
            "010" | "011" | "012" | "901" => Some(DataError::Unauthorized {
                status: status_owned,
                message: message_owned,
            }),
            "020" => Some(DataError::RateLimited(format!("[{status}] {message}"))),
            "800" => Some(DataError::Unavailable(format!("[{status}] {message}"))),
            _ => Some(DataError::Api {
                status: status_owned,
                message: message_owned,
            }),
        }
    }

    /// HTTP 오류 응답을 에러로 변환합니다.
    pub fn from_http_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            DataError::RateLimited(format!("HTTP {}", status.as_u16()))
        } else if status.is_server_error() {
            DataError::Unavailable(format!("HTTP {}: {}", status.as_u16(), body))
        } else {
            DataError::Http {
                status: status.as_u16(),
                body,
            }
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if err.is_decode() {
            DataError::Parse(err.to_string())
        } else {
            DataError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
