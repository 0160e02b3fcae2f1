//! 모니터 공통 에러 타입.

use thiserror::Error;

/// 설정 단계에서 발생하는 에러.
///
/// 모두 치명적이며 네트워크 호출 이전에 실행을 중단시킵니다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 필수 환경 변수 누락
    #[error("필수 환경 변수가 설정되지 않았습니다: {0}")]
    MissingEnv(String),

    /// 잘못된 설정 값
    #[error("설정 에러: {0}")]
    Config(String),

    /// 설정 파일 로드/역직렬화 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),
}

/// 코어 작업용 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
