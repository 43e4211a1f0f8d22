mod api;
mod config;
mod constants;
mod policy;

use clap::Parser;
use ledger_core::Ledger;
use tracing::{info, warn, Level};

use crate::api::{router, AppState};
use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = args.open_store()?;
    let difficulty = args.difficulty;
    // genesis mining and the initial load are blocking work
    let ledger = tokio::task::spawn_blocking(move || Ledger::open(store, difficulty)).await??;

    if let Err(violation) = ledger.verify() {
        warn!(
            "chain loaded from {} is not valid: {violation}",
            ledger.store().describe()
        );
    }
    info!(
        "ledger ready: {} blocks, difficulty {}, tip {}",
        ledger.len(),
        ledger.difficulty(),
        ledger.last().hash()
    );

    let app = router(AppState::new(ledger, &args.system_account));

    info!("ledger-node listening on http://{}", args.listen);
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
