//! 장내매수 이벤트.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Filing;

/// 공시 상세에서 추출한 매수 이벤트.
///
/// 추출에 실패한 필드는 `None`으로 남습니다. 일부 필드가 비어 있어도
/// 이벤트는 알림 대상입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    /// 원본 공시
    pub filing: Filing,
    /// 보고자 (추출 실패 시 공시 제출인명)
    pub reporter: String,
    /// 직위
    pub position: Option<String>,
    /// 거래 유형 라벨 (예: "장내매수")
    pub transaction_type: String,
    /// 주식 수
    pub shares: Option<i64>,
    /// 단가 (원)
    pub price: Option<Decimal>,
    /// 거래일
    pub transaction_date: Option<NaiveDate>,
    /// 상세 본문 미리보기
    pub content_preview: String,
    /// 탐지 시각
    pub detected_at: DateTime<Utc>,
}

impl PurchaseEvent {
    /// 접수번호 (중복 제거 키).
    pub fn receipt_no(&self) -> &str {
        &self.filing.receipt_no
    }

    /// 거래 금액 (주식 수 × 단가). 둘 중 하나라도 없으면 `None`.
    pub fn total_value(&self) -> Option<Decimal> {
        match (self.shares, self.price) {
            (Some(shares), Some(price)) => price.checked_mul(Decimal::from(shares)),
            _ => None,
        }
    }

    /// 추출되지 않은 필드가 있는지 확인합니다.
    pub fn is_partial(&self) -> bool {
        self.position.is_none()
            || self.shares.is_none()
            || self.price.is_none()
            || self.transaction_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(shares: Option<i64>, price: Option<Decimal>) -> PurchaseEvent {
        PurchaseEvent {
            filing: Filing {
                receipt_no: "20250718000001".to_string(),
                corp_name: "테스트전자".to_string(),
                corp_code: "00000001".to_string(),
                stock_code: "000001".to_string(),
                corp_class: None,
                title: "임원ㆍ주요주주특정증권등소유상황보고서".to_string(),
                filer_name: "최종태".to_string(),
                receipt_date: None,
                remark: String::new(),
            },
            reporter: "최종태".to_string(),
            position: None,
            transaction_type: "장내매수".to_string(),
            shares,
            price,
            transaction_date: None,
            content_preview: String::new(),
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_value() {
        let event = sample(Some(1000), Some(dec!(12870)));
        assert_eq!(event.total_value(), Some(dec!(12870000)));
        assert_eq!(event.receipt_no(), "20250718000001");
    }

    #[test]
    fn test_total_value_missing_field() {
        assert_eq!(sample(None, Some(dec!(100))).total_value(), None);
        assert_eq!(sample(Some(10), None).total_value(), None);
        assert!(sample(Some(10), None).is_partial());
    }
}
