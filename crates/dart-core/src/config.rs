//! 설정 관리.
//!
//! 설정은 두 부분으로 나뉩니다:
//! - [`Credentials`]: 환경 변수에서만 읽는 비밀값 (API 키, 봇 토큰, 채팅 ID)
//! - [`MonitorSettings`]: 설정 파일(`config/monitor.toml`) + `MONITOR__` 환경 변수 오버라이드
//!
//! 키워드 목록은 코드가 아닌 설정 데이터로 관리되어 동작을 재현/감사할 수 있습니다.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// OpenDart API 키 환경 변수.
pub const ENV_DART_API_KEY: &str = "DART_API_KEY";
/// 텔레그램 봇 토큰 환경 변수.
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// 텔레그램 채팅 ID 환경 변수.
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

/// 외부에서 주입되는 자격 증명.
///
/// `Debug` 출력 시 비밀값은 마스킹됩니다.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// OpenDart 인증키 (`crtfc_key`)
    pub dart_api_key: SecretString,
    /// 텔레그램 봇 토큰
    pub telegram_bot_token: SecretString,
    /// 텔레그램 채팅 ID
    pub telegram_chat_id: String,
}

impl Credentials {
    /// 환경 변수에서 자격 증명을 로드합니다.
    ///
    /// `.env` 파일은 호출 측에서 미리 읽어 둡니다 (`dotenvy::dotenv`).
    /// 하나라도 없거나 비어 있으면 [`CoreError::MissingEnv`]를 반환합니다.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 자격 증명을 로드합니다.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> CoreResult<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CoreError::MissingEnv(key.to_string()))
        };

        let dart_api_key = required(ENV_DART_API_KEY)?;
        let telegram_bot_token = required(ENV_TELEGRAM_BOT_TOKEN)?;
        let telegram_chat_id = required(ENV_TELEGRAM_CHAT_ID)?;

        Ok(Self {
            dart_api_key: SecretString::new(dart_api_key.into()),
            telegram_bot_token: SecretString::new(telegram_bot_token.into()),
            telegram_chat_id,
        })
    }
}

/// 모니터 전체 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// OpenDart API 설정
    pub dart: DartSettings,
    /// 텔레그램 설정
    pub telegram: TelegramSettings,
    /// 공시 제목 필터
    pub filter: FilterSettings,
    /// 매수 탐지기 설정
    pub detector: DetectorSettings,
    /// 상태/산출물 경로
    pub state: StateSettings,
    /// 실행 설정
    pub run: RunSettings,
    /// 로깅 설정
    pub logging: LoggingSettings,
}

/// OpenDart API 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DartSettings {
    /// API 기본 URL
    pub base_url: String,
    /// 조회할 법인 구분 코드 (Y: 유가증권, K: 코스닥)
    pub corp_classes: Vec<String>,
    /// 페이지당 건수 (최대 100)
    pub page_count: u32,
    /// 법인 구분별 최대 페이지 수
    pub max_pages: u32,
    /// API 호출 간 최소 간격 (밀리초)
    pub request_interval_ms: u64,
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 재시도 설정
    pub retry: RetrySettings,
}

impl Default for DartSettings {
    fn default() -> Self {
        Self {
            base_url: "https://opendart.fss.or.kr/api".to_string(),
            corp_classes: vec!["Y".to_string(), "K".to_string()],
            page_count: 100,
            max_pages: 10,
            request_interval_ms: 500,
            timeout_secs: 30,
            retry: RetrySettings::default(),
        }
    }
}

/// 재시도 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 시간 (밀리초)
    pub initial_delay_ms: u64,
    /// 재시도마다 곱해지는 배수
    pub backoff_factor: u32,
    /// 최대 대기 시간 (밀리초)
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_factor: 2,
            max_delay_ms: 10_000,
        }
    }
}

/// 텔레그램 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Bot API 기본 URL
    pub base_url: String,
    /// 파싱 모드 (HTML 또는 MarkdownV2)
    pub parse_mode: String,
    /// 링크 미리보기 비활성화
    pub disable_web_page_preview: bool,
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.telegram.org".to_string(),
            parse_mode: "HTML".to_string(),
            disable_web_page_preview: true,
            timeout_secs: 30,
        }
    }
}

/// 공시 제목 필터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// 임원 소유상황보고서 제목 키워드 (부분 문자열 일치)
    pub title_keywords: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        // 가운뎃점(ㆍ)과 중점(·) 표기가 섞여 들어오므로 둘 다 나열합니다.
        Self {
            title_keywords: vec![
                "임원ㆍ주요주주특정증권등소유상황보고서".to_string(),
                "임원·주요주주특정증권등소유상황보고서".to_string(),
                "임원특정증권등소유상황보고서".to_string(),
                "주요주주특정증권등소유상황보고서".to_string(),
            ],
        }
    }
}

/// 매수 키워드와 거래 유형 라벨.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PurchaseKeyword {
    /// 본문에서 찾을 키워드
    pub keyword: String,
    /// 일치 시 부여할 거래 유형 라벨
    pub label: String,
}

impl PurchaseKeyword {
    /// 새 키워드를 생성합니다.
    pub fn new(keyword: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            label: label.into(),
        }
    }
}

/// 매수 탐지기 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// 매수 키워드 (앞에 있을수록 우선)
    pub purchase_keywords: Vec<PurchaseKeyword>,
    /// 본문 미리보기 길이 (문자 수)
    pub preview_chars: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            purchase_keywords: vec![
                PurchaseKeyword::new("장내매수", "장내매수"),
                PurchaseKeyword::new("장내 매수", "장내매수"),
                PurchaseKeyword::new("매수", "매수"),
                PurchaseKeyword::new("취득", "취득"),
            ],
            preview_chars: 200,
        }
    }
}

/// 상태 파일 및 산출물 경로 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StateSettings {
    /// 알림 완료 접수번호 파일
    pub seen_path: PathBuf,
    /// 실행 결과/로그 파일 디렉터리
    pub output_dir: PathBuf,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            seen_path: PathBuf::from("state/seen_filings.json"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// 실행 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunSettings {
    /// 조회 기간 (오늘 기준 며칠 전까지)
    pub days_back: u32,
    /// 매수 공시가 없을 때 완료 메시지 전송
    pub notify_when_empty: bool,
    /// 실행 실패 시 오류 메시지 전송
    pub notify_on_error: bool,
    /// 매수 탐지 후 대기 시간 (밀리초)
    pub pause_after_detection_ms: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            days_back: 1,
            notify_when_empty: true,
            notify_on_error: true,
            pause_after_detection_ms: 1000,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
    /// 출력 디렉터리에 실행별 로그 파일 기록
    pub write_file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            write_file: true,
        }
    }
}

impl MonitorSettings {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값을 사용합니다. `MONITOR__DART__PAGE_COUNT=50`처럼
    /// 환경 변수로 개별 값을 덮어쓸 수 있습니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("MONITOR")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("dart.corp_classes")
                    .with_list_parse_key("filter.title_keywords")
                    .try_parsing(true),
            );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 설정 값의 유효성을 검사합니다.
    pub fn validate(&self) -> CoreResult<()> {
        if self.filter.title_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(CoreError::Config(
                "filter.title_keywords가 비어 있습니다".to_string(),
            ));
        }
        if self.detector.purchase_keywords.is_empty() {
            return Err(CoreError::Config(
                "detector.purchase_keywords가 비어 있습니다".to_string(),
            ));
        }
        if self.dart.corp_classes.is_empty() {
            return Err(CoreError::Config(
                "dart.corp_classes가 비어 있습니다".to_string(),
            ));
        }
        if !(1..=100).contains(&self.dart.page_count) {
            return Err(CoreError::Config(format!(
                "dart.page_count는 1~100이어야 합니다: {}",
                self.dart.page_count
            )));
        }
        if self.dart.retry.max_attempts == 0 {
            return Err(CoreError::Config(
                "dart.retry.max_attempts는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_all_present() {
        let creds = Credentials::from_lookup(lookup(&[
            (ENV_DART_API_KEY, "dart-key"),
            (ENV_TELEGRAM_BOT_TOKEN, "bot-token"),
            (ENV_TELEGRAM_CHAT_ID, "12345"),
        ]))
        .unwrap();

        assert_eq!(creds.dart_api_key.expose_secret(), "dart-key");
        assert_eq!(creds.telegram_chat_id, "12345");
        assert!(!format!("{:?}", creds).contains("bot-token"));
    }

    #[test]
    fn test_credentials_missing_is_fatal() {
        let err = Credentials::from_lookup(lookup(&[
            (ENV_DART_API_KEY, "dart-key"),
            (ENV_TELEGRAM_CHAT_ID, "12345"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingEnv(ref key) if key == ENV_TELEGRAM_BOT_TOKEN));
    }

    #[test]
    fn test_credentials_blank_is_missing() {
        let err = Credentials::from_lookup(lookup(&[
            (ENV_DART_API_KEY, "  "),
            (ENV_TELEGRAM_BOT_TOKEN, "bot-token"),
            (ENV_TELEGRAM_CHAT_ID, "12345"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingEnv(ref key) if key == ENV_DART_API_KEY));
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = MonitorSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.run.days_back, 1);
        assert_eq!(settings.filter.title_keywords.len(), 4);
        assert_eq!(settings.detector.purchase_keywords[0].keyword, "장내매수");
    }

    #[test]
    fn test_validate_rejects_bad_page_count() {
        let mut settings = MonitorSettings::default();
        settings.dart.page_count = 0;
        assert!(matches!(settings.validate(), Err(CoreError::Config(_))));
    }
}
