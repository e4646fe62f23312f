use std::env;

use anyhow::Context;

use crate::prelude::*;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:invoices.db?mode=rwc";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_REMINDER_HOURS: u64 = 24;

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  /// Base used for links in emails, without trailing slash.
  pub app_url: String,
  /// Hours between reminder sweeps, 0 disables the job.
  pub reminder_hours: u64,
  pub admins: HashSet<i64>,
  pub mail: MailConfig,
}

#[derive(Debug, Clone, Default)]
pub struct MailConfig {
  pub relay_url: Option<String>,
  pub relay_secret: Option<String>,
  pub from: String,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup(
    var: impl Fn(&str) -> Option<String>,
  ) -> anyhow::Result<Self> {
    let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    let reminder_hours = match non_empty("REMINDER_INTERVAL_HOURS") {
      Some(hours) => hours
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Invalid REMINDER_INTERVAL_HOURS: {hours}"))?,
      None => DEFAULT_REMINDER_HOURS,
    };
    reminder_hours.checked_mul(3600).with_context(|| {
      format!("REMINDER_INTERVAL_HOURS too large: {reminder_hours}")
    })?;

    let admins = non_empty("ADMIN_IDS")
      .unwrap_or_default()
      .split(',')
      .filter(|s| !s.trim().is_empty())
      .map(|id| {
        id.trim()
          .parse::<i64>()
          .with_context(|| format!("Invalid admin id: {id}"))
      })
      .collect::<anyhow::Result<HashSet<_>>>()?;

    let app_url = non_empty("APP_URL")
      .unwrap_or_else(|| DEFAULT_APP_URL.into())
      .trim_end_matches('/')
      .to_string();

    Ok(Self {
      database_url: non_empty("DATABASE_URL")
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
      app_url,
      reminder_hours,
      admins,
      mail: MailConfig {
        relay_url: non_empty("MAIL_RELAY_URL"),
        relay_secret: non_empty("MAIL_RELAY_SECRET"),
        from: non_empty("MAIL_FROM")
          .unwrap_or_else(|| "noreply@localhost".into()),
      },
    })
  }

  pub fn reminder_interval(&self) -> Option<Duration> {
    self
      .reminder_hours
      .checked_mul(3600)
      .filter(|secs| *secs > 0)
      .map(Duration::from_secs)
  }
}
