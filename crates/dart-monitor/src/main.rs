//! OpenDart 임원 장내매수 모니터 CLI.

use std::path::PathBuf;

use clap::Parser;
use dart_core::{
    init_logging, now_kst, Credentials, DateWindow, LogConfig, LogFormat, MonitorSettings,
    DEFAULT_CONFIG_PATH,
};
use dart_data::OpenDartClient;
use dart_monitor::{Monitor, MonitorError, RunOptions, SeenStore};
use dart_notification::{TelegramConfig, TelegramSender};

#[derive(Parser)]
#[command(name = "dart-monitor")]
#[command(about = "OpenDart 임원 장내매수 모니터", long_about = None)]
#[command(version)]
struct Cli {
    /// 조회 기간 (오늘 기준 며칠 전부터)
    #[arg(long)]
    days_back: Option<u32>,

    /// 설정 파일 경로
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long)]
    log_format: Option<String>,

    /// 알림 전송과 상태 저장 없이 탐지만 수행
    #[arg(long)]
    dry_run: bool,

    /// 시작 시 텔레그램 확인 메시지 전송
    #[arg(long)]
    ping: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // 설정 로드
    let settings = MonitorSettings::load(&cli.config)?;

    // 로깅 초기화
    let level = cli.log_level.unwrap_or_else(|| settings.logging.level.clone());
    let format: LogFormat = cli
        .log_format
        .as_deref()
        .unwrap_or(settings.logging.format.as_str())
        .parse()?;
    let mut log_config = LogConfig::new(level).with_format(format);
    if settings.logging.write_file {
        let file_name = format!("dart_monitor_{}.log", now_kst().format("%Y%m%d_%H%M%S"));
        log_config = log_config.with_log_file(settings.state.output_dir.join(file_name));
    }
    init_logging(log_config)?;

    tracing::info!(config = %cli.config.display(), "OpenDart 임원 매수 모니터 시작");

    let credentials = Credentials::from_env().map_err(|e| {
        tracing::error!(error = %e, "환경 변수를 확인하세요");
        MonitorError::from(e)
    })?;

    let days_back = cli.days_back.unwrap_or(settings.run.days_back);
    let window = DateWindow::lookback_from_now(days_back).map_err(MonitorError::from)?;
    tracing::info!(window = %window, days_back, "모니터링 기간");

    let source = OpenDartClient::new(credentials.dart_api_key.clone(), &settings.dart)
        .map_err(MonitorError::from)?;
    let notifier = TelegramSender::new(TelegramConfig::from_credentials(
        &credentials,
        &settings.telegram,
    ))
    .map_err(MonitorError::from)?;
    let monitor = Monitor::new(source, notifier, &settings)?;

    // 손상된 상태 파일은 네트워크 호출 전에 실행을 중단
    let mut store = SeenStore::load(&settings.state.seen_path).map_err(|e| {
        tracing::error!(error = %e, "상태 파일 로드 실패, 실행 중단");
        e
    })?;

    let options = RunOptions {
        dry_run: cli.dry_run,
        ping: cli.ping,
    };
    let report = monitor.run(window, &mut store, options).await?;

    tracing::info!(
        purchases = report.counts.purchases_detected,
        elapsed = format!("{:.1}s", report.elapsed().as_secs_f64()),
        "모니터링 완료"
    );
    Ok(())
}
