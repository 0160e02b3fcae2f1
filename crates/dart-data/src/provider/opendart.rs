//! OpenDart API 클라이언트.
//!
//! 금융감독원 전자공시시스템(DART) Open API에서 공시 목록과 본문을 조회합니다.
//!
//! # 엔드포인트
//!
//! - `list.json`: 기간/시장별 공시 목록 (페이지 단위)
//! - `document.json`: 단일 공시 본문 블록
//!
//! # 상태 코드
//!
//! | 코드 | 의미 | 처리 |
//! |------|------|------|
//! | 000 | 정상 | - |
//! | 013 | 조회 데이터 없음 | 빈 결과 |
//! | 020 | 요청 제한 초과 | 재시도 |
//! | 800 | 시스템 점검 | 재시도 |
//! | 010/011/012/901 | 인증키 오류 | 즉시 실패 |
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use dart_data::{DisclosureSource, OpenDartClient};
//!
//! let client = OpenDartClient::new(credentials.dart_api_key.clone(), &settings.dart)?;
//! let window = DateWindow::lookback_from_now(1)?;
//! let filings = client.fetch_filings(&window).await?;
//! ```

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use dart_core::{parse_dart_date, DartSettings, DateWindow, Filing};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{DisclosureSource, FilingDocument};
use crate::error::{DataError, Result};
use crate::retry::{retry, RetryPolicy};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// OpenDart API 클라이언트.
pub struct OpenDartClient {
    client: reqwest::Client,
    api_key: SecretString,
    settings: DartSettings,
    retry_policy: RetryPolicy,
    /// 마지막 요청 시각 (요청 간격 유지용)
    last_request: Mutex<Option<Instant>>,
}

/// 목록 응답.
#[derive(Debug, Deserialize)]
struct ListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    total_page: Option<u32>,
    #[serde(default)]
    list: Vec<RawFiling>,
}

/// 목록 응답의 공시 항목.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFiling {
    corp_cls: String,
    corp_name: String,
    corp_code: String,
    stock_code: String,
    report_nm: String,
    rcept_no: String,
    flr_nm: String,
    rcept_dt: String,
    rm: String,
}

impl From<RawFiling> for Filing {
    fn from(raw: RawFiling) -> Self {
        Filing {
            corp_class: raw.corp_cls.parse().ok(),
            receipt_date: parse_dart_date(&raw.rcept_dt),
            receipt_no: raw.rcept_no.trim().to_string(),
            corp_name: raw.corp_name.trim().to_string(),
            corp_code: raw.corp_code,
            stock_code: raw.stock_code.trim().to_string(),
            title: raw.report_nm.trim().to_string(),
            filer_name: raw.flr_nm.trim().to_string(),
            remark: raw.rm,
        }
    }
}

/// 본문 응답.
#[derive(Debug, Deserialize)]
struct DocumentResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    list: Vec<RawDocumentBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocumentBlock {
    content: String,
}

/// 한 페이지 조회 결과.
#[derive(Debug)]
struct ListPage {
    filings: Vec<Filing>,
    /// 응답에 포함된 항목 수 (변환 전)
    raw_count: usize,
    total_page: Option<u32>,
}

impl OpenDartClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(api_key: SecretString, settings: &DartSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        Ok(Self {
            client,
            api_key,
            retry_policy: RetryPolicy::from(&settings.retry),
            settings: settings.clone(),
            last_request: Mutex::new(None),
        })
    }

    /// 재시도 정책을 교체합니다.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// 직전 요청 이후 최소 간격이 지날 때까지 대기합니다.
    async fn pace(&self) {
        let interval = Duration::from_millis(self.settings.request_interval_ms);
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET 요청 후 본문을 역직렬화합니다. HTTP 오류는 상태 코드별로 분류됩니다.
    async fn get_json<T>(&self, path: &str, query: Vec<(&'static str, String)>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.pace().await;

        let response = self
            .client
            .get(self.endpoint(path))
            .query(&[("crtfc_key", self.api_key.expose_secret())])
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DataError::from_http_status(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_list_page(
        &self,
        corp_cls: &str,
        window: &DateWindow,
        page_no: u32,
    ) -> Result<ListPage> {
        let query = vec![
            ("bgn_de", window.bgn_de()),
            ("end_de", window.end_de()),
            ("corp_cls", corp_cls.to_string()),
            ("page_no", page_no.to_string()),
            ("page_count", self.settings.page_count.to_string()),
        ];

        let response: ListResponse = self.get_json("list.json", query).await?;
        if let Some(err) = DataError::from_dart_status(&response.status, &response.message) {
            return Err(err);
        }

        let raw_count = response.list.len();
        let filings = response
            .list
            .into_iter()
            .filter(|raw| !raw.rcept_no.trim().is_empty())
            .map(Filing::from)
            .collect::<Vec<_>>();

        if filings.len() < raw_count {
            warn!(
                corp_cls = corp_cls,
                page_no = page_no,
                skipped = raw_count - filings.len(),
                "접수번호 없는 공시 항목 제외"
            );
        }

        Ok(ListPage {
            filings,
            raw_count,
            total_page: response.total_page,
        })
    }

    async fn fetch_document_once(&self, receipt_no: &str) -> Result<FilingDocument> {
        let response: DocumentResponse = self
            .get_json("document.json", vec![("rcept_no", receipt_no.to_string())])
            .await?;

        // 013은 본문 없음으로 처리
        if let Some(err) = DataError::from_dart_status(&response.status, &response.message) {
            return Err(err);
        }

        let blocks = response
            .list
            .into_iter()
            .map(|b| b.content)
            .filter(|c| !c.trim().is_empty())
            .collect::<Vec<_>>();

        Ok(FilingDocument::new(receipt_no, blocks))
    }

    /// 한 시장의 모든 페이지를 조회합니다.
    async fn fetch_market(&self, corp_cls: &str, window: &DateWindow) -> Result<Vec<Filing>> {
        let this = self;
        let page_count = self.settings.page_count as usize;
        let max_pages = self.settings.max_pages.max(1);
        let mut filings = Vec::new();
        let mut page_no = 1;

        loop {
            let page = retry(&self.retry_policy, "list.json", move || {
                this.fetch_list_page(corp_cls, window, page_no)
            })
            .await?;

            debug!(
                corp_cls = corp_cls,
                page_no = page_no,
                count = page.raw_count,
                total_page = ?page.total_page,
                "공시 목록 페이지 조회"
            );

            let is_last = match page.total_page {
                Some(total) => page_no >= total,
                None => page.raw_count < page_count,
            } || page.raw_count == 0;
            filings.extend(page.filings);

            if is_last {
                break;
            }
            if page_no >= max_pages {
                warn!(
                    corp_cls = corp_cls,
                    max_pages = max_pages,
                    total_page = ?page.total_page,
                    "페이지 상한 도달, 나머지 페이지 생략"
                );
                break;
            }
            page_no += 1;
        }

        Ok(filings)
    }
}

#[async_trait]
impl DisclosureSource for OpenDartClient {
    async fn fetch_filings(&self, window: &DateWindow) -> Result<Vec<Filing>> {
        let mut seen = HashSet::new();
        let mut filings = Vec::new();

        for corp_cls in &self.settings.corp_classes {
            let market = self.fetch_market(corp_cls, window).await?;
            let fetched = market.len();
            filings.extend(
                market
                    .into_iter()
                    .filter(|f| seen.insert(f.receipt_no.clone())),
            );
            info!(corp_cls = %corp_cls, count = fetched, "시장별 공시 목록 조회 완료");
        }

        info!(window = %window, count = filings.len(), "공시 목록 조회 완료");
        Ok(filings)
    }

    async fn fetch_document(&self, receipt_no: &str) -> Result<FilingDocument> {
        let this = self;
        let document = retry(&self.retry_policy, "document.json", move || {
            this.fetch_document_once(receipt_no)
        })
        .await?;

        debug!(receipt_no = receipt_no, blocks = document.blocks.len(), "공시 본문 조회");
        Ok(document)
    }

    fn name(&self) -> &str {
        "opendart"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_filing_conversion() {
        let raw: RawFiling = serde_json::from_str(
            r#"{
                "corp_code": "00126380",
                "corp_name": "삼성전자",
                "stock_code": "005930",
                "corp_cls": "Y",
                "report_nm": "임원ㆍ주요주주특정증권등소유상황보고서 ",
                "rcept_no": "20250718000123",
                "flr_nm": "홍길동",
                "rcept_dt": "20250718",
                "rm": ""
            }"#,
        )
        .unwrap();

        let filing = Filing::from(raw);
        assert_eq!(filing.receipt_no, "20250718000123");
        assert_eq!(filing.title, "임원ㆍ주요주주특정증권등소유상황보고서");
        assert_eq!(filing.corp_class, Some(dart_core::CorpClass::Kospi));
        assert_eq!(
            filing.receipt_date,
            chrono::NaiveDate::from_ymd_opt(2025, 7, 18)
        );
    }

    #[test]
    fn test_list_response_tolerates_missing_fields() {
        let response: ListResponse =
            serde_json::from_str(r#"{"status":"013","message":"조회된 데이타가 없습니다."}"#)
                .unwrap();
        assert!(response.list.is_empty());
        assert!(response.total_page.is_none());
    }
}
