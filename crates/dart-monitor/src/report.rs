//! 실행 결과 기록.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Seoul;
use dart_core::{format_kst, DateWindow, PurchaseEvent};
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// 실행 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// 실행 단계별 건수.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// 조회된 공시 수
    pub filings_fetched: usize,
    /// 제목 필터 통과 수
    pub filings_matched: usize,
    /// 이미 처리된 공시 수
    pub already_seen: usize,
    /// 본문 확인 수
    pub documents_checked: usize,
    /// 본문이 비어 있어 건너뛴 수
    pub documents_empty: usize,
    /// 매수 탐지 수
    pub purchases_detected: usize,
    /// 알림 전송 성공 수
    pub notifications_sent: usize,
    /// 알림 전송 실패 수
    pub notifications_failed: usize,
    /// 복구된 에러 수
    pub errors: usize,
}

/// 단일 실행 기록.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub window: DateWindow,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub error: Option<String>,
    pub dry_run: bool,
    pub counts: RunCounts,
    pub purchases: Vec<PurchaseEvent>,
    started: Instant,
    elapsed: Duration,
}

/// JSON 결과 파일 형식.
#[derive(Serialize)]
struct RunArtifact<'a> {
    window: &'a DateWindow,
    started_at: String,
    finished_at: Option<String>,
    elapsed_secs: f64,
    status: RunStatus,
    error: Option<&'a str>,
    dry_run: bool,
    counts: &'a RunCounts,
    purchases: &'a [PurchaseEvent],
}

impl RunReport {
    pub fn new(window: DateWindow, dry_run: bool) -> Self {
        Self {
            window,
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            error: None,
            dry_run,
            counts: RunCounts::default(),
            purchases: Vec::new(),
            started: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    /// 탐지된 매수 이벤트를 기록합니다.
    pub fn record_purchase(&mut self, purchase: PurchaseEvent) {
        self.counts.purchases_detected += 1;
        self.purchases.push(purchase);
    }

    /// 정상 완료로 마감합니다.
    pub fn complete(&mut self) {
        self.finish(RunStatus::Completed);
    }

    /// 실패로 마감합니다.
    pub fn fail(&mut self, error: &MonitorError) {
        self.counts.errors += 1;
        self.error = Some(error.to_string());
        self.finish(RunStatus::Failed);
    }

    fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.elapsed = self.started.elapsed();
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        let c = &self.counts;
        tracing::info!(
            window = %self.window,
            status = ?self.status,
            dry_run = self.dry_run,
            filings_fetched = c.filings_fetched,
            filings_matched = c.filings_matched,
            already_seen = c.already_seen,
            documents_checked = c.documents_checked,
            documents_empty = c.documents_empty,
            purchases_detected = c.purchases_detected,
            notifications_sent = c.notifications_sent,
            notifications_failed = c.notifications_failed,
            errors = c.errors,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "모니터링 요약"
        );

        tracing::info!(window = %self.window, "{}", self.outcome_line());
    }

    /// 요약 로그의 결과 한 줄.
    pub fn outcome_line(&self) -> String {
        if self.status == RunStatus::Completed && self.counts.purchases_detected == 0 {
            "0 results: 신규 임원 장내매수 공시 없음".to_string()
        } else {
            format!("총 {}건의 임원 매수 발견", self.counts.purchases_detected)
        }
    }

    /// 결과 파일 이름 (`dart_monitor_{KST 시작 시각}.json`).
    pub fn artifact_name(&self) -> String {
        format!(
            "dart_monitor_{}.json",
            self.started_at.with_timezone(&Seoul).format("%Y%m%d_%H%M%S")
        )
    }

    /// `dir` 아래에 JSON 결과 파일을 씁니다.
    pub fn write_artifact(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| MonitorError::io(dir, e))?;

        let artifact = RunArtifact {
            window: &self.window,
            started_at: format_kst(&self.started_at),
            finished_at: self.finished_at.as_ref().map(format_kst),
            elapsed_secs: self.elapsed.as_secs_f64(),
            status: self.status,
            error: self.error.as_deref(),
            dry_run: self.dry_run,
            counts: &self.counts,
            purchases: &self.purchases,
        };

        let path = dir.join(self.artifact_name());
        let json = serde_json::to_string_pretty(&artifact)?;
        fs::write(&path, json).map_err(|e| MonitorError::io(&path, e))?;

        tracing::info!(path = %path.display(), "결과 저장 완료");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 19).unwrap(),
        )
    }

    #[test]
    fn test_artifact_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = RunReport::new(window(), false);
        report.counts.filings_fetched = 7;
        report.complete();

        let path = report.write_artifact(dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("dart_monitor_"));
        assert!(name.ends_with(".json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["counts"]["filings_fetched"], 7);
        assert_eq!(json["window"]["start"], "2025-07-18");
        assert!(json["started_at"].as_str().unwrap().ends_with("KST"));
        assert!(json["purchases"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_line() {
        let mut report = RunReport::new(window(), false);
        report.complete();
        assert!(report.outcome_line().starts_with("0 results"));

        let mut report = RunReport::new(window(), false);
        report.counts.purchases_detected = 2;
        report.complete();
        assert_eq!(report.outcome_line(), "총 2건의 임원 매수 발견");
    }

    #[test]
    fn test_fail_records_error() {
        let mut report = RunReport::new(window(), false);
        report.fail(&MonitorError::from(dart_data::DataError::Network(
            "connection reset".to_string(),
        )));

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.counts.errors, 1);
        assert!(report.error.as_deref().unwrap().contains("connection reset"));
        assert!(report.finished_at.is_some());
    }
}
