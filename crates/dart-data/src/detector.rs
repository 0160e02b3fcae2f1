//! 공시 본문 기반 장내매수 탐지기.
//!
//! 설정된 매수 키워드 중 본문에 처음 등장하는 항목(설정 순서 기준)이
//! 거래 유형을 결정합니다. 매도와 매수가 함께 언급된 공시를 구분하는
//! 로직은 없습니다 (알려진 휴리스틱 한계).
//!
//! 수치 필드 추출에 실패하면 해당 필드만 비운 채 이벤트를 반환합니다.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use dart_core::{DetectorSettings, Filing, PurchaseEvent, PurchaseKeyword};
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::Result;

/// 천 단위 쉼표 숫자 (예: `1,000`, `12870`). 앞 글자가 숫자/쉼표인 위치는 제외합니다.
const NUMBER: &str = r"(?:^|[^\d,])(\d{1,3}(?:,\d{3})+|\d+)";

/// 장내매수 탐지기.
#[derive(Debug, Clone)]
pub struct PurchaseDetector {
    keywords: Vec<PurchaseKeyword>,
    preview_chars: usize,
    reporter_re: Regex,
    position_re: Regex,
    shares_re: Regex,
    price_re: Regex,
    date_re: Regex,
}

impl PurchaseDetector {
    /// 설정에서 탐지기를 생성합니다.
    pub fn new(settings: &DetectorSettings) -> Result<Self> {
        Ok(Self {
            keywords: settings
                .purchase_keywords
                .iter()
                .filter(|k| !k.keyword.is_empty())
                .cloned()
                .collect(),
            preview_chars: settings.preview_chars,
            reporter_re: Regex::new(r"보고자[:：\s]*([가-힣]+)")?,
            position_re: Regex::new(r"직위[:：\s]*([가-힣][가-힣 ]*)")?,
            shares_re: Regex::new(&format!(r"{NUMBER}\s*주"))?,
            price_re: Regex::new(&format!(r"{NUMBER}\s*원"))?,
            date_re: Regex::new(r"(\d{4})[-./](\d{1,2})[-./](\d{1,2})")?,
        })
    }

    /// 본문의 거래 유형을 판별합니다.
    ///
    /// 설정 순서상 처음으로 본문에 포함된 키워드를 반환합니다.
    pub fn classify(&self, content: &str) -> Option<&PurchaseKeyword> {
        self.keywords
            .iter()
            .find(|k| content.contains(k.keyword.as_str()))
    }

    /// 단일 본문에서 매수 이벤트를 추출합니다.
    pub fn detect(&self, filing: &Filing, content: &str) -> Option<PurchaseEvent> {
        let matched = self.classify(content)?;

        let reporter = self
            .capture(&self.reporter_re, content)
            .unwrap_or_else(|| filing.filer_name.clone());
        let shares = self
            .capture(&self.shares_re, content)
            .and_then(|raw| parse_count(&raw));
        let price = self
            .capture(&self.price_re, content)
            .and_then(|raw| parse_amount(&raw));
        let transaction_date = self.date_re.captures(content).and_then(|caps| {
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        });

        if shares.is_none() || price.is_none() {
            tracing::debug!(
                receipt_no = %filing.receipt_no,
                shares = ?shares,
                price = ?price,
                "수치 필드 일부 추출 실패"
            );
        }

        Some(PurchaseEvent {
            filing: filing.clone(),
            reporter,
            position: self.capture(&self.position_re, content),
            transaction_type: matched.label.clone(),
            shares,
            price,
            transaction_date,
            content_preview: preview(content, self.preview_chars),
            detected_at: Utc::now(),
        })
    }

    /// 여러 본문 블록 중 처음 일치하는 블록에서 이벤트를 추출합니다.
    pub fn detect_document<S: AsRef<str>>(
        &self,
        filing: &Filing,
        blocks: &[S],
    ) -> Option<PurchaseEvent> {
        blocks
            .iter()
            .find_map(|block| self.detect(filing, block.as_ref()))
    }

    fn capture(&self, re: &Regex, content: &str) -> Option<String> {
        re.captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// 쉼표가 포함된 주식 수를 파싱합니다. 범위를 넘으면 `None`.
pub fn parse_count(raw: &str) -> Option<i64> {
    raw.replace(',', "").parse().ok()
}

/// 쉼표가 포함된 금액을 파싱합니다.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "")).ok()
}

fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn detector() -> PurchaseDetector {
        PurchaseDetector::new(&DetectorSettings::default()).unwrap()
    }

    fn filing() -> Filing {
        Filing {
            receipt_no: "20250718000456".to_string(),
            corp_name: "테스트반도체".to_string(),
            corp_code: "00999999".to_string(),
            stock_code: "099999".to_string(),
            corp_class: None,
            title: "임원ㆍ주요주주특정증권등소유상황보고서".to_string(),
            filer_name: "최종태".to_string(),
            receipt_date: None,
            remark: String::new(),
        }
    }

    #[test]
    fn test_open_market_purchase_values() {
        let detector = detector();
        let event = detector
            .detect(&filing(), "장내매수 1,000주 12,870원")
            .unwrap();

        assert_eq!(event.transaction_type, "장내매수");
        assert_eq!(event.shares, Some(1000));
        assert_eq!(event.price, Some(dec!(12870)));
        assert_eq!(event.reporter, "최종태");
    }

    #[test]
    fn test_extracts_labelled_fields() {
        let detector = detector();
        let content = "보고자: 김민수\n직위: 대표이사\n거래일 2025.07.17 장내 매수 25,000 주 8,450 원";
        let event = detector.detect(&filing(), content).unwrap();

        assert_eq!(event.reporter, "김민수");
        assert_eq!(event.position.as_deref(), Some("대표이사"));
        assert_eq!(event.transaction_type, "장내매수");
        assert_eq!(event.shares, Some(25_000));
        assert_eq!(event.price, Some(dec!(8450)));
        assert_eq!(event.transaction_date, NaiveDate::from_ymd_opt(2025, 7, 17));
    }

    #[test]
    fn test_unparseable_fields_degrade() {
        let detector = detector();
        let content = "장내매수 99999999999999999999주 단가 미정 2025-13-45";
        let event = detector.detect(&filing(), content).unwrap();

        assert_eq!(event.shares, None);
        assert_eq!(event.price, None);
        assert_eq!(event.transaction_date, None);
        assert!(event.is_partial());
    }

    #[test]
    fn test_malformed_separator_is_not_read_as_number() {
        let detector = detector();
        let event = detector.detect(&filing(), "장내매수 1,00주").unwrap();
        assert_eq!(event.shares, None);
    }

    #[test]
    fn test_keyword_order_decides_label() {
        let detector = detector();
        assert_eq!(detector.classify("신주 취득 및 매수").unwrap().label, "매수");
        assert_eq!(detector.classify("신주 취득").unwrap().label, "취득");
        assert!(detector.classify("장내매도 500주").is_none());
    }

    #[test]
    fn test_no_keyword_no_event() {
        let detector = detector();
        assert!(detector.detect(&filing(), "장내매도 1,000주 5,000원").is_none());
    }

    #[test]
    fn test_detect_document_first_matching_block() {
        let detector = detector();
        let blocks = vec![
            "표지".to_string(),
            "장내매수 300주 1,000원".to_string(),
            "장내매수 900주 2,000원".to_string(),
        ];
        let event = detector.detect_document(&filing(), &blocks).unwrap();
        assert_eq!(event.shares, Some(300));
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        assert_eq!(preview("가나다라", 2), "가나...");
        assert_eq!(preview("가나", 2), "가나");
    }
}
