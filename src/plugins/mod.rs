pub mod cron;

use std::sync::Arc;

use tokio_util::task::TaskTracker;

use crate::state::AppState;

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Box<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  /// Spawns every plugin and blocks until ctrl-c or until all of them
  /// returned, then cancels `app.shutdown` and waits for the stragglers.
  pub async fn run(self, app: Arc<AppState>) {
    let tracker = TaskTracker::new();

    for plugin in self.plugins {
      let app = app.clone();
      let name = plugin.name();

      tracing::info!("init `{}`", name);

      tracker.spawn(async move {
        if let Err(err) = plugin.start(app).await {
          tracing::error!("failed `{}`: {err}", name);
        }
      });
    }

    tracker.close();

    tokio::select! {
      _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
      _ = tracker.wait() => tracing::warn!("all plugins exited"),
    }

    app.shutdown.cancel();
    tracker.wait().await;
  }
}
