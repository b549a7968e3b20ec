use wallet_onboarding_lib::bootstrap::{self, tracing::init_tracing_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = bootstrap::resolve_config()?;
    init_tracing_subscriber()?;
    tracing::info!(?config, "configuration loaded");

    let launch_url = std::env::args().nth(1);
    bootstrap::run_app(config, launch_url).await
}
