use splitbill::{
  config::Config,
  plugins::{App, cron},
  prelude::*,
  state::AppState,
};
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "splitbill=debug,migration=info,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting splitbill v{}", env!("CARGO_PKG_VERSION"));

  if config.admins.is_empty() {
    warn!("No admins configured, payment overrides disabled");
  }

  let app = Arc::new(AppState::new(config).await?);

  App::new().register(cron::Reminders).run(app).await;

  Ok(())
}
