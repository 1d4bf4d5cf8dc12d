use std::process::ExitCode;
use std::sync::Arc;

use bracket_trader::config::{credentials_from_env, AppConfig};
use bracket_trader::exchange::apex::ApexClient;
use bracket_trader::services::orchestrator::{BracketRequest, OrderOrchestrator};
use bracket_trader::services::retry::{RetryExecutor, RetryPolicy};
use bracket_trader::EventBus;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: bracket_trader <symbol> <direction> <leverage> <tp_percent> <sl_percent>";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != BracketRequest::ARG_COUNT {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    // Setup Logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {}", e);
    }

    let request = match BracketRequest::from_args(args.as_slice()) {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid arguments: {}", e);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };
    info!(
        "Arguments received: symbol={}, direction={}, leverage={}, tp_percent={}, sl_percent={}",
        request.symbol, request.direction, request.leverage, request.tp_percent, request.sl_percent
    );

    dotenvy::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded Configuration: {:?}", config);

    let credentials = match credentials_from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let venue = match ApexClient::new(&config.venue, credentials) {
        Ok(v) => Arc::new(v),
        Err(e) => {
            error!("Failed to build venue client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let bus = EventBus::new(config.event_bus_capacity);
    let retry = RetryExecutor::new(RetryPolicy::from(&config.retry), bus.clone());
    let orchestrator = OrderOrchestrator::new(venue, retry, bus);

    match orchestrator.place_bracket(&request).await {
        Ok(report) => {
            info!("Initial Order: {} ({})", report.entry.id, report.entry.status);
            info!("Stop Loss Order: {} ({})", report.stop_loss.id, report.stop_loss.status);
            info!("Take Profit Order: {} ({})", report.take_profit.id, report.take_profit.status);
            ExitCode::SUCCESS
        }
        Err(abort) => {
            if abort.error.is_validation() {
                error!("Trade inputs rejected after {}: {}", abort.stage, abort.error);
            }
            for ack in &abort.submitted {
                error!("Order left outstanding: {} {} ({})", ack.leg, ack.id, ack.status);
            }
            ExitCode::from(abort.exit_code())
        }
    }
}
