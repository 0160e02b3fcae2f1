//! 텔레그램 알림 서비스.
//!
//! Telegram Bot API를 통해 임원 장내매수 알림과 모니터링 상태를 전송합니다.
//! 재시도는 하지 않습니다. 실패한 알림은 호출자가 기록하고 건너뜁니다.

use std::time::Duration;

use async_trait::async_trait;
use dart_core::{format_kst, Credentials, PurchaseEvent, TelegramSettings};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::types::{
    Notification, NotificationError, NotificationEvent, NotificationResult, NotificationSender,
};

/// 값이 없을 때 표시 문자열.
const MISSING: &str = "N/A";

/// 429 응답에 `retry_after`가 없을 때 기본 대기 시간 (초).
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// 오류 알림 본문 최대 길이 (문자).
const MAX_ERROR_CHARS: usize = 200;

/// 텔레그램 알림 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// @BotFather에서 받은 봇 토큰
    pub bot_token: SecretString,
    /// 메시지를 보낼 채팅 ID
    pub chat_id: String,
    /// 전송 활성화 여부
    pub enabled: bool,
    /// 파싱 모드 (HTML 또는 MarkdownV2)
    pub parse_mode: String,
    /// 링크 미리보기 비활성화
    pub disable_web_page_preview: bool,
    /// Bot API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl TelegramConfig {
    /// 새 텔레그램 설정을 생성합니다.
    pub fn new(bot_token: SecretString, chat_id: String) -> Self {
        Self::from_settings(bot_token, chat_id, &TelegramSettings::default())
    }

    fn from_settings(bot_token: SecretString, chat_id: String, settings: &TelegramSettings) -> Self {
        Self {
            bot_token,
            chat_id,
            enabled: true,
            parse_mode: settings.parse_mode.clone(),
            disable_web_page_preview: settings.disable_web_page_preview,
            base_url: settings.base_url.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }

    /// 자격 증명과 설정 파일 값으로 설정을 생성합니다.
    pub fn from_credentials(credentials: &Credentials, settings: &TelegramSettings) -> Self {
        Self::from_settings(
            credentials.telegram_bot_token.clone(),
            credentials.telegram_chat_id.clone(),
            settings,
        )
    }

    /// Bot API 기본 URL을 설정합니다.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Bot API 오류 응답.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 텔레그램 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> NotificationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotificationError::InvalidConfig(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        Ok(Self { config, client })
    }

    /// 알림을 텔레그램 메시지로 포맷합니다.
    pub fn format_message(&self, notification: &Notification) -> String {
        let sent_at = format_kst(&notification.timestamp);

        match &notification.event {
            NotificationEvent::PurchaseDetected { purchase } => {
                format_purchase(purchase, &sent_at)
            }

            NotificationEvent::RunCompleted {
                window,
                filings_checked,
                purchases,
            } => {
                let result = if *purchases == 0 {
                    "임원 매수 공시 없음".to_string()
                } else {
                    format!("임원 매수 {purchases}건")
                };
                format!(
                    "📊 <b>모니터링 완료</b>\n\n\
                     📅 <b>조회 기간:</b> {}\n\
                     🔍 <b>검색 방식:</b> OpenDart API\n\
                     📑 <b>확인 공시:</b> {filings_checked}건\n\
                     📋 <b>결과:</b> {result}\n\
                     ⏰ <b>완료 시간:</b> {sent_at}\n\n\
                     #모니터링완료 #OpenDart",
                    escape_html(window)
                )
            }

            NotificationEvent::Startup { window } => format!(
                "🧪 <b>OpenDart 임원 매수 모니터링 시작</b>\n\n\
                 📅 <b>조회 기간:</b> {}\n\
                 🤖 <b>상태:</b> 모니터링 봇 정상 작동\n\
                 ⏰ <b>시작 시간:</b> {sent_at}\n\n\
                 #테스트 #OpenDart #모니터링",
                escape_html(window)
            ),

            NotificationEvent::SystemError {
                error_code,
                message,
            } => {
                let mut detail: String = message.chars().take(MAX_ERROR_CHARS).collect();
                if message.chars().count() > MAX_ERROR_CHARS {
                    detail.push_str("...");
                }
                format!(
                    "❌ <b>시스템 오류</b>\n\n\
                     🏷 <b>코드:</b> <code>{}</code>\n\
                     🚨 <b>오류 내용:</b> {}\n\
                     ⏰ <b>발생 시간:</b> {sent_at}\n\n\
                     #시스템오류 #OpenDart",
                    escape_html(error_code),
                    escape_html(&detail)
                )
            }
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.base_url.trim_end_matches('/'),
            self.config.bot_token.expose_secret()
        )
    }

    /// 텔레그램에 원시 메시지를 전송합니다.
    async fn send_message(&self, text: &str) -> NotificationResult<()> {
        let params = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": self.config.parse_mode,
            "disable_web_page_preview": self.config.disable_web_page_preview,
        });

        debug!(chat_id = %self.config.chat_id, "텔레그램 메시지 전송");

        let response = self
            .client
            .post(self.endpoint())
            .json(&params)
            .send()
            .await
            .map_err(|e| NotificationError::NetworkError(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            info!("텔레그램 메시지 전송 성공");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ApiErrorBody>(&body).ok();

        if status.as_u16() == 429 {
            let retry_after = parsed
                .as_ref()
                .and_then(|b| b.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(retry_after = retry_after, "텔레그램 요청 한도 초과");
            return Err(NotificationError::RateLimited(retry_after));
        }

        let description = parsed.and_then(|b| b.description).unwrap_or(body);
        error!(status = status.as_u16(), description = %description, "텔레그램 메시지 전송 실패");
        Err(NotificationError::SendFailed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            description
        )))
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("텔레그램 알림 비활성화, 전송 생략");
            return Ok(());
        }

        let message = self.format_message(notification);
        self.send_message(&message).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
            && !self.config.bot_token.expose_secret().is_empty()
            && !self.config.chat_id.is_empty()
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

fn format_purchase(purchase: &PurchaseEvent, sent_at: &str) -> String {
    let filing = &purchase.filing;
    let text = |value: Option<String>| {
        value
            .map(|v| escape_html(&v))
            .unwrap_or_else(|| MISSING.to_string())
    };

    let shares = text(purchase.shares.map(|s| format!("{}주", group_digits(&s.to_string()))));
    let price = text(purchase.price.map(|p| format!("{}원", format_decimal(p))));
    let value_line = purchase
        .total_value()
        .map(|v| format!("💎 <b>거래금액:</b> {}원\n", format_decimal(v)))
        .unwrap_or_default();
    let hashtag: String = purchase
        .transaction_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    format!(
        "🏢 <b>임원 장내매수 알림</b>\n\n\
         📊 <b>회사명:</b> {}\n\
         📈 <b>종목코드:</b> {}\n\
         👤 <b>보고자:</b> {}\n\
         💼 <b>직위:</b> {}\n\
         💰 <b>거래유형:</b> {}\n\
         📊 <b>주식수:</b> {shares}\n\
         💵 <b>가격:</b> {price}\n\
         {value_line}\
         📅 <b>거래일:</b> {}\n\
         📋 <b>접수번호:</b> <a href=\"{}\">{}</a>\n\
         📅 <b>공시일:</b> {}\n\n\
         ⏰ <b>알림시간:</b> {sent_at}\n\n\
         #임원매수 #OpenDart #{}",
        escape_html(&filing.corp_name),
        text(Some(filing.stock_code.clone()).filter(|s| !s.is_empty())),
        escape_html(&purchase.reporter),
        text(purchase.position.clone()),
        escape_html(&purchase.transaction_type),
        text(purchase.transaction_date.map(|d| d.to_string())),
        escape_html(&filing.viewer_url()),
        escape_html(&filing.receipt_no),
        text(filing.receipt_date.map(|d| d.to_string())),
        escape_html(&hashtag),
    )
}

/// HTML 파싱 모드용 이스케이프.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 천 단위 쉼표를 넣습니다 (`12870` → `12,870`).
fn group_digits(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}")
}

fn format_decimal(value: Decimal) -> String {
    let normalized = value.normalize().to_string();
    match normalized.split_once('.') {
        Some((int, frac)) => format!("{}.{frac}", group_digits(int)),
        None => group_digits(&normalized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use dart_core::Filing;
    use rust_decimal_macros::dec;

    fn sender() -> TelegramSender {
        let config = TelegramConfig::new(
            SecretString::new("test_token".to_string().into()),
            "123456".to_string(),
        );
        TelegramSender::new(config).unwrap()
    }

    fn purchase() -> PurchaseEvent {
        PurchaseEvent {
            filing: Filing {
                receipt_no: "20250718000456".to_string(),
                corp_name: "A&B <테크>".to_string(),
                corp_code: "00999999".to_string(),
                stock_code: "099999".to_string(),
                corp_class: None,
                title: "임원ㆍ주요주주특정증권등소유상황보고서".to_string(),
                filer_name: "최종태".to_string(),
                receipt_date: NaiveDate::from_ymd_opt(2025, 7, 18),
                remark: String::new(),
            },
            reporter: "최종태".to_string(),
            position: None,
            transaction_type: "장내매수".to_string(),
            shares: Some(1000),
            price: Some(dec!(12870)),
            transaction_date: None,
            content_preview: "장내매수 1,000주 12,870원".to_string(),
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_purchase_message() {
        let message = sender().format_message(&Notification::purchase(purchase()));

        assert!(message.contains("임원 장내매수 알림"));
        assert!(message.contains("A&amp;B &lt;테크&gt;"));
        assert!(message.contains("1,000주"));
        assert!(message.contains("12,870원"));
        assert!(message.contains("12,870,000원"));
        assert!(message.contains("💼 <b>직위:</b> N/A"));
        assert!(message.contains("rcpNo=20250718000456"));
        assert!(message.contains("KST"));
        assert!(message.ends_with("#임원매수 #OpenDart #장내매수"));
    }

    #[test]
    fn test_format_completion_without_purchases() {
        let notification = Notification::new(NotificationEvent::RunCompleted {
            window: "2025-07-18 ~ 2025-07-19".to_string(),
            filings_checked: 12,
            purchases: 0,
        });
        let message = sender().format_message(&notification);

        assert!(message.contains("모니터링 완료"));
        assert!(message.contains("임원 매수 공시 없음"));
        assert!(message.contains("12건"));
    }

    #[test]
    fn test_format_system_error_truncates() {
        let long = "가".repeat(300);
        let message = sender().format_message(&Notification::system_error("FETCH", long));

        assert!(message.contains(&format!("{}...", "가".repeat(200))));
        assert!(!message.contains(&"가".repeat(201)));
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits("0"), "0");
        assert_eq!(group_digits("870"), "870");
        assert_eq!(group_digits("12870"), "12,870");
        assert_eq!(group_digits("-1234567"), "-1,234,567");
        assert_eq!(format_decimal(dec!(1234.50)), "1,234.5");
    }

    #[test]
    fn test_disabled_without_chat_id() {
        let config = TelegramConfig::new(
            SecretString::new("test_token".to_string().into()),
            String::new(),
        );
        assert!(!TelegramSender::new(config).unwrap().is_enabled());
    }
}
