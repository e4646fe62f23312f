//! Outgoing reminder mail.
//!
//! The sweep only cares whether a reminder was delivered, so [`Mailer`]
//! reports a plain `bool` and adapters log their own failures.

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Serialize;

use crate::{config::MailConfig, prelude::*};

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send_invoice_reminder(
    &self,
    to: &str,
    display_name: &str,
    invoice_title: &str,
    invoice_url: &str,
  ) -> bool;
}

pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
  match &config.relay_url {
    Some(url) => Arc::new(RelayMailer::new(
      url.clone(),
      config.relay_secret.clone(),
      config.from.clone(),
    )),
    None => {
      warn!("MAIL_RELAY_URL not set, reminders will only be logged");
      Arc::new(LogMailer)
    }
  }
}

/// Writes reminders to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
  async fn send_invoice_reminder(
    &self,
    to: &str,
    display_name: &str,
    invoice_title: &str,
    invoice_url: &str,
  ) -> bool {
    info!(
      "Reminder for {} <{}>: approve \"{}\" at {}",
      display_name, to, invoice_title, invoice_url
    );
    true
  }
}

#[derive(Debug, Serialize)]
pub struct ReminderMail<'a> {
  pub from: &'a str,
  pub to: &'a str,
  pub subject: String,
  pub text: String,
}

impl<'a> ReminderMail<'a> {
  pub fn new(
    from: &'a str,
    to: &'a str,
    display_name: &str,
    invoice_title: &str,
    invoice_url: &str,
  ) -> Self {
    Self {
      from,
      to,
      subject: format!("Reminder: please review \"{invoice_title}\""),
      text: format!(
        "Hi {display_name},\n\n\
        You have not approved the invoice \"{invoice_title}\" yet.\n\
        Review it here: {invoice_url}\n"
      ),
    }
  }
}

/// Posts reminders as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct RelayMailer {
  client: Client,
  url: String,
  secret: Option<String>,
  from: String,
}

impl RelayMailer {
  pub fn new(url: String, secret: Option<String>, from: String) -> Self {
    Self { client: Client::new(), url, secret, from }
  }

  async fn deliver(&self, mail: &ReminderMail<'_>) -> Result<()> {
    let body = json::to_vec(mail)
      .map_err(|e| Error::Mail(format!("Failed to encode mail: {}", e)))?;

    let mut request =
      self.client.post(&self.url).header(CONTENT_TYPE, "application/json");

    if let Some(secret) = &self.secret {
      request = request.header("X-Signature", sign(secret, &body));
    }

    let response = request
      .body(body)
      .send()
      .await
      .map_err(|e| Error::Mail(format!("Request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
      return Err(Error::Mail(format!("Relay responded with {}", status)));
    }

    Ok(())
  }
}

#[async_trait]
impl Mailer for RelayMailer {
  async fn send_invoice_reminder(
    &self,
    to: &str,
    display_name: &str,
    invoice_title: &str,
    invoice_url: &str,
  ) -> bool {
    let mail = ReminderMail::new(
      &self.from,
      to,
      display_name,
      invoice_title,
      invoice_url,
    );

    match self.deliver(&mail).await {
      Ok(()) => true,
      Err(err) => {
        warn!("Failed to send reminder to {}: {}", to, err);
        false
      }
    }
  }
}

/// Hex HMAC-SHA256 of the request body, checked by the relay.
pub fn sign(secret: &str, body: &[u8]) -> String {
  use hmac::{Hmac, Mac};
  use sha2::Sha256;

  type HmacSha256 = Hmac<Sha256>;

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .expect("HMAC can take key of any size");
  mac.update(body);

  hex::encode(mac.finalize().into_bytes())
}
