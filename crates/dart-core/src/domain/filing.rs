//! 공시 목록 레코드.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 법인 구분 (OpenDart `corp_cls`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorpClass {
    /// 유가증권시장 (Y)
    Kospi,
    /// 코스닥 (K)
    Kosdaq,
    /// 코넥스 (N)
    Konex,
    /// 기타법인 (E)
    Etc,
}

impl CorpClass {
    /// API 파라미터 코드를 반환합니다.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Kospi => "Y",
            Self::Kosdaq => "K",
            Self::Konex => "N",
            Self::Etc => "E",
        }
    }
}

impl std::str::FromStr for CorpClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "Y" => Ok(Self::Kospi),
            "K" => Ok(Self::Kosdaq),
            "N" => Ok(Self::Konex),
            "E" => Ok(Self::Etc),
            _ => Err(format!("Unknown corp class: {}", s)),
        }
    }
}

/// 공시 목록 API가 반환하는 단일 공시.
///
/// 한 번의 실행 동안만 존재하며 수신 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    /// 접수번호 (14자리, 고유 ID)
    pub receipt_no: String,
    /// 회사명
    pub corp_name: String,
    /// 고유번호 (8자리)
    pub corp_code: String,
    /// 종목코드 (6자리, 비상장사는 빈 문자열)
    pub stock_code: String,
    /// 법인 구분
    pub corp_class: Option<CorpClass>,
    /// 보고서명
    pub title: String,
    /// 공시 제출인명
    pub filer_name: String,
    /// 접수일자
    pub receipt_date: Option<NaiveDate>,
    /// 비고
    #[serde(default)]
    pub remark: String,
}

impl Filing {
    /// 공시 뷰어 URL.
    pub fn viewer_url(&self) -> String {
        format!(
            "https://dart.fss.or.kr/dsaf001/main.do?rcpNo={}",
            self.receipt_no
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corp_class_round_trip_codes() {
        for class in [
            CorpClass::Kospi,
            CorpClass::Kosdaq,
            CorpClass::Konex,
            CorpClass::Etc,
        ] {
            assert_eq!(class.code().parse::<CorpClass>().unwrap(), class);
        }
        assert_eq!("k".parse::<CorpClass>().unwrap(), CorpClass::Kosdaq);
        assert!("X".parse::<CorpClass>().is_err());
    }

    #[test]
    fn test_viewer_url() {
        let filing = Filing {
            receipt_no: "20250718000123".to_string(),
            corp_name: "테스트".to_string(),
            corp_code: "00123456".to_string(),
            stock_code: "123456".to_string(),
            corp_class: Some(CorpClass::Kospi),
            title: "임원ㆍ주요주주특정증권등소유상황보고서".to_string(),
            filer_name: "홍길동".to_string(),
            receipt_date: None,
            remark: String::new(),
        };
        assert!(filing.viewer_url().ends_with("rcpNo=20250718000123"));
    }
}
