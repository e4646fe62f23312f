use std::sync::Arc;

use async_trait::async_trait;
use tokio::time;

use crate::{plugins::Plugin, prelude::*, state::AppState};

pub struct Reminders;

#[async_trait]
impl Plugin for Reminders {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let Some(interval) = app.config.reminder_interval() else {
      info!("Reminders disabled via config (0 hours)");
      return Ok(());
    };

    info!(
      "Reminder service started (Interval: {})",
      humantime::format_duration(interval)
    );

    run_reminders(&app, interval).await;
    Ok(())
  }
}

/// Sweeps, then sleeps for `interval`, so cycles never overlap. A running
/// sweep is never interrupted; only the sleep observes shutdown.
pub async fn run_reminders(app: &AppState, interval: Duration) {
  while !app.shutdown.is_cancelled() {
    let now = Utc::now().naive_utc();

    match app.reminder().sweep(now).await {
      Ok(report) if report.changes() > 0 || report.failed > 0 => info!(
        "Reminder sweep: {} invoice(s), {} started, {} sent, {} failed",
        report.invoices, report.initialized, report.sent, report.failed
      ),
      Ok(report) => {
        debug!("Reminder sweep: {} invoice(s), no changes", report.invoices)
      }
      Err(e) => error!("Reminder sweep failed: {}", e),
    }

    tokio::select! {
      _ = app.shutdown.cancelled() => break,
      _ = time::sleep(interval) => {}
    }
  }

  info!("Reminder service stopped");
}
