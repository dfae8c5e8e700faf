use crate::cli::ServeArgs;
use crate::infra::{load_holidays, AppState};
use crate::routes::with_leave_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leave_ledger::config::AppConfig;
use leave_ledger::error::AppError;
use leave_ledger::leave::{InMemoryLeaveStore, LeaveService};
use leave_ledger::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.holidays_csv.take() {
        config.leave.holidays_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let holidays = load_holidays(config.leave.holidays_csv.as_deref())?;
    let store = Arc::new(InMemoryLeaveStore::with_max_attempts(
        config.leave.max_transaction_attempts,
    ));
    let leave_service = Arc::new(LeaveService::new(store));

    let app = with_leave_routes(leave_service, holidays)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_transaction_attempts = config.leave.max_transaction_attempts,
        "leave ledger ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
