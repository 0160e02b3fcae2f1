//! 조회 기간 및 KST 시간 유틸리티.

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::{Asia::Seoul, Tz};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// OpenDart 날짜 파라미터 형식.
pub const DART_DATE_FORMAT: &str = "%Y%m%d";

/// 현재 KST 시각.
pub fn now_kst() -> DateTime<Tz> {
    Utc::now().with_timezone(&Seoul)
}

/// UTC 시각을 KST 문자열로 포맷합니다.
pub fn format_kst(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Seoul)
        .format("%Y-%m-%d %H:%M:%S KST")
        .to_string()
}

/// `YYYYMMDD` 문자열을 파싱합니다. `YYYY-MM-DD`, `YYYY.MM.DD`, `YYYY/MM/DD`도 허용합니다.
pub fn parse_dart_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let normalized: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if normalized.len() == 8 && normalized.len() == s.len() {
        return NaiveDate::parse_from_str(&normalized, DART_DATE_FORMAT).ok();
    }

    let parts: Vec<&str> = s.split(['-', '.', '/']).map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    let year = parts[0].parse().ok()?;
    let month = parts[1].parse().ok()?;
    let day = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// 공시 조회 기간 (양 끝 포함).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// 시작일
    pub start: NaiveDate,
    /// 종료일
    pub end: NaiveDate,
}

impl DateWindow {
    /// 새 조회 기간을 생성합니다. `start > end`이면 두 값을 바꿉니다.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// `today`로부터 `days_back`일 이전까지의 기간.
    ///
    /// 시작일이 표현 가능한 날짜 범위를 벗어나면 [`CoreError::Config`]를 반환합니다.
    pub fn lookback(today: NaiveDate, days_back: u32) -> CoreResult<Self> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .ok_or_else(|| CoreError::Config(format!("days_back 값이 너무 큽니다: {days_back}")))?;
        Ok(Self::new(start, today))
    }

    /// KST 오늘 기준 look-back 기간.
    pub fn lookback_from_now(days_back: u32) -> CoreResult<Self> {
        Self::lookback(now_kst().date_naive(), days_back)
    }

    /// 시작일 (`bgn_de`).
    pub fn bgn_de(&self) -> String {
        self.start.format(DART_DATE_FORMAT).to_string()
    }

    /// 종료일 (`end_de`).
    pub fn end_de(&self) -> String {
        self.end.format(DART_DATE_FORMAT).to_string()
    }

    /// 날짜가 기간 안에 있는지 확인합니다.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", self.bgn_de(), self.end_de())
    }
}
