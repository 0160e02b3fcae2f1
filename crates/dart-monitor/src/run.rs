//! 단일 모니터링 실행.
//!
//! 모든 단계는 순차적으로 실행됩니다. 한 HTTP 호출이 끝나야 다음 호출이
//! 시작됩니다.
//!
//! # 처리 순서
//!
//! 1. 공시 목록 조회 (전체 페이지)
//! 2. 제목 필터
//! 3. 이미 처리된 접수번호 제외
//! 4. 공시 본문 조회 및 매수 탐지
//! 5. 매수 건별 텔레그램 알림
//! 6. 상태 파일 저장 (실행이 중단되어도 수행)
//! 7. 요약 로그 및 결과 파일

use std::path::PathBuf;
use std::time::Duration;

use dart_core::{DateWindow, Filing, MonitorSettings, RunSettings};
use dart_data::{DisclosureSource, PurchaseDetector, TitleFilter};
use dart_notification::{Notification, NotificationEvent, NotificationSender};
use tracing::{debug, error, info, warn};

use crate::error::{MonitorError, Result};
use crate::report::RunReport;
use crate::store::SeenStore;

/// 실행 옵션 (CLI 플래그).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// 알림 전송과 상태 저장을 생략
    pub dry_run: bool,
    /// 시작 시 확인 메시지 전송
    pub ping: bool,
}

/// 모니터 실행기.
pub struct Monitor<S, N> {
    source: S,
    notifier: N,
    filter: TitleFilter,
    detector: PurchaseDetector,
    run: RunSettings,
    output_dir: PathBuf,
}

impl<S, N> Monitor<S, N>
where
    S: DisclosureSource,
    N: NotificationSender,
{
    pub fn new(source: S, notifier: N, settings: &MonitorSettings) -> Result<Self> {
        Ok(Self {
            source,
            notifier,
            filter: TitleFilter::from_settings(&settings.filter),
            detector: PurchaseDetector::new(&settings.detector)?,
            run: settings.run.clone(),
            output_dir: settings.state.output_dir.clone(),
        })
    }

    /// 한 번의 모니터링을 실행합니다.
    ///
    /// 처리 도중 에러로 중단되어도 그때까지 추가된 접수번호는 저장됩니다.
    pub async fn run(
        &self,
        window: DateWindow,
        store: &mut SeenStore,
        options: RunOptions,
    ) -> Result<RunReport> {
        info!(
            window = %window,
            source = self.source.name(),
            notifier = self.notifier.name(),
            dry_run = options.dry_run,
            "임원 매수 모니터링 시작"
        );

        let mut report = RunReport::new(window, options.dry_run);

        if options.ping && !options.dry_run {
            self.send_best_effort(Notification::new(NotificationEvent::Startup {
                window: window.to_string(),
            }))
            .await;
        }

        let mut outcome = self.process(&window, store, &mut report, options).await;

        if options.dry_run {
            info!(pending = store.added(), "dry-run: 상태 저장 생략");
        } else if let Err(e) = store.flush() {
            error!(error = %e, "상태 파일 저장 실패");
            if outcome.is_ok() {
                outcome = Err(e);
            } else {
                report.counts.errors += 1;
            }
        }

        match &outcome {
            Ok(()) => report.complete(),
            Err(e) => report.fail(e),
        }
        report.log_summary();

        if let Err(e) = report.write_artifact(&self.output_dir) {
            error!(error = %e, "결과 저장 실패");
        }

        match outcome {
            Ok(()) => {
                if report.counts.purchases_detected == 0
                    && self.run.notify_when_empty
                    && !options.dry_run
                {
                    self.send_best_effort(Notification::new(NotificationEvent::RunCompleted {
                        window: window.to_string(),
                        filings_checked: report.counts.filings_matched,
                        purchases: 0,
                    }))
                    .await;
                }
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, code = e.code(), "실행 중 오류 발생");
                if !options.dry_run {
                    self.report_failure(&e).await;
                }
                Err(e)
            }
        }
    }

    /// 실패 알림을 보냅니다 (`run.notify_on_error`가 꺼져 있으면 생략).
    pub async fn report_failure(&self, err: &MonitorError) {
        if self.run.notify_on_error {
            self.send_best_effort(Notification::system_error(err.code(), err.to_string()))
                .await;
        }
    }

    async fn process(
        &self,
        window: &DateWindow,
        store: &mut SeenStore,
        report: &mut RunReport,
        options: RunOptions,
    ) -> Result<()> {
        let filings = self.source.fetch_filings(window).await?;
        report.counts.filings_fetched = filings.len();

        let candidates = self.filter.apply(filings);
        report.counts.filings_matched = candidates.len();
        info!(
            fetched = report.counts.filings_fetched,
            matched = candidates.len(),
            "임원 공시 필터링 완료"
        );

        if candidates.is_empty() {
            info!("임원 공시가 없습니다");
            return Ok(());
        }

        for filing in candidates {
            if store.contains(&filing.receipt_no) {
                report.counts.already_seen += 1;
                debug!(receipt_no = %filing.receipt_no, "이미 처리된 공시");
                continue;
            }

            self.inspect(&filing, store, report, options).await?;
        }

        Ok(())
    }

    /// 공시 한 건의 본문을 확인하고 매수이면 알림을 보냅니다.
    async fn inspect(
        &self,
        filing: &Filing,
        store: &mut SeenStore,
        report: &mut RunReport,
        options: RunOptions,
    ) -> Result<()> {
        info!(
            corp_name = %filing.corp_name,
            filer = %filing.filer_name,
            receipt_no = %filing.receipt_no,
            "공시 상세 확인"
        );

        let document = match self.source.fetch_document(&filing.receipt_no).await {
            Ok(document) => document,
            Err(e) if e.is_fatal() || e.is_retryable() => return Err(e.into()),
            Err(e) => {
                // 다음 실행에서 다시 확인
                report.counts.errors += 1;
                warn!(receipt_no = %filing.receipt_no, error = %e, "공시 본문 조회 실패, 건너뜀");
                return Ok(());
            }
        };
        if document.is_empty() {
            // 본문이 아직 공개되지 않은 공시는 다음 실행에서 다시 확인
            report.counts.documents_empty += 1;
            warn!(receipt_no = %filing.receipt_no, "공시 본문 없음, 건너뜀");
            return Ok(());
        }
        report.counts.documents_checked += 1;

        let Some(purchase) = self.detector.detect_document(filing, &document.blocks) else {
            debug!(receipt_no = %filing.receipt_no, "장내매수 아님");
            store.add(filing.receipt_no.clone());
            return Ok(());
        };

        info!(
            corp_name = %filing.corp_name,
            reporter = %purchase.reporter,
            transaction_type = %purchase.transaction_type,
            shares = ?purchase.shares,
            price = ?purchase.price,
            "장내매수 발견"
        );
        report.record_purchase(purchase.clone());

        if options.dry_run {
            info!(receipt_no = %filing.receipt_no, "dry-run: 알림 생략");
            return Ok(());
        }

        match self.notifier.send(&Notification::purchase(purchase)).await {
            Ok(()) => {
                report.counts.notifications_sent += 1;
                store.add(filing.receipt_no.clone());
            }
            Err(e) => {
                // 접수번호를 남기지 않아 다음 실행에서 재시도
                report.counts.notifications_failed += 1;
                error!(receipt_no = %filing.receipt_no, error = %e, "알림 전송 실패");
            }
        }

        if self.run.pause_after_detection_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.run.pause_after_detection_ms)).await;
        }

        Ok(())
    }

    async fn send_best_effort(&self, notification: Notification) {
        if let Err(e) = self.notifier.send(&notification).await {
            warn!(notifier = self.notifier.name(), error = %e, "상태 알림 전송 실패");
        }
    }
}
