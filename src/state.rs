use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tokio_util::sync::CancellationToken;

use crate::{
  config::Config,
  policy::Actor,
  prelude::*,
  sv::{self, Mailer},
};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub mailer: Arc<dyn Mailer>,
  /// Cancelled once on shutdown; long-running plugins select on it.
  pub shutdown: CancellationToken,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.database_url)
      .await
      .with_context(|| {
        format!("Failed to connect to {}", config.database_url)
      })?;

    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    let mailer = sv::mail::from_config(&config.mail);

    Ok(Self::with_parts(db, config, mailer))
  }

  pub fn with_parts(
    db: DatabaseConnection,
    config: Config,
    mailer: Arc<dyn Mailer>,
  ) -> Self {
    Self { db, config, mailer, shutdown: CancellationToken::new() }
  }

  /// Authorization context for a request made by `user_id`.
  pub fn actor(&self, user_id: i64) -> Actor {
    if self.config.admins.contains(&user_id) {
      Actor::admin(user_id)
    } else {
      Actor::user(user_id)
    }
  }

  pub fn reminder(&self) -> sv::Reminder<'_> {
    sv::Reminder::new(&self.db, self.mailer.as_ref(), &self.config.app_url)
  }
}
