//! Reminder emails for participants who have not approved an invoice.
//!
//! A participant seen for the first time only gets their clock started;
//! the first email goes out once [`REMINDER_DEBOUNCE_HOURS`] have passed,
//! and every following one after the same delay.

use sea_orm::sea_query::Expr;

use crate::{
  entity::{InvoiceStatus, participant, user},
  prelude::*,
  sv::{self, InvoiceDetails, mail::Mailer},
};

pub const REMINDER_DEBOUNCE_HOURS: i64 = 48;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
  pub invoices: usize,
  /// Participants whose reminder clock was started.
  pub initialized: usize,
  pub sent: usize,
  pub failed: usize,
  /// Stamps dropped because the participant row was gone at save time.
  pub vanished: usize,
}

impl SweepReport {
  pub fn changes(&self) -> usize {
    self.initialized + self.sent
  }
}

pub fn invoice_url(app_url: &str, invoice_id: Uuid) -> String {
  format!("{}/invoices/{}", app_url, invoice_id)
}

pub struct Reminder<'a> {
  db: &'a DatabaseConnection,
  mailer: &'a dyn Mailer,
  app_url: &'a str,
}

impl<'a> Reminder<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    mailer: &'a dyn Mailer,
    app_url: &'a str,
  ) -> Self {
    Self { db, mailer, app_url }
  }

  /// One pass over every active invoice. All timestamp updates of the pass
  /// are saved in a single transaction, or not at all when nothing changed.
  /// A participant removed while the pass ran is skipped, never fatal.
  pub async fn sweep(&self, now: DateTime) -> Result<SweepReport> {
    let active =
      sv::Invoice::new(self.db).by_status(InvoiceStatus::Active).await?;

    let mut report =
      SweepReport { invoices: active.len(), ..Default::default() };
    let mut changes = Vec::new();

    for details in &active {
      if let Err(err) =
        self.visit(details, now, &mut report, &mut changes).await
      {
        error!(
          "Reminder sweep skipped invoice {}: {}",
          details.invoice.id, err
        );
      }
    }

    if changes.is_empty() {
      debug!("Reminder sweep: nothing to save");
      return Ok(report);
    }

    let txn = self.db.begin().await?;
    for (invoice_id, user_id) in changes {
      let result = participant::Entity::update_many()
        .col_expr(participant::Column::LastReminderSentAt, Expr::value(now))
        .filter(participant::Column::InvoiceId.eq(invoice_id))
        .filter(participant::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

      if result.rows_affected == 0 {
        warn!(
          "Participant {} left invoice {} during reminder sweep",
          user_id, invoice_id
        );
        report.vanished += 1;
      }
    }
    txn.commit().await?;

    Ok(report)
  }

  async fn visit(
    &self,
    details: &InvoiceDetails,
    now: DateTime,
    report: &mut SweepReport,
    changes: &mut Vec<(Uuid, i64)>,
  ) -> Result<()> {
    let approved = details.approved_users();
    let debounce = TimeDelta::hours(REMINDER_DEBOUNCE_HOURS);

    let pending =
      details.participants.iter().filter(|p| !approved.contains(&p.user_id));

    for participant in pending {
      match participant.last_reminder_sent_at {
        None => {
          changes.push((participant.invoice_id, participant.user_id));
          report.initialized += 1;
        }
        Some(last) if now - last >= debounce => {
          let user = user::Entity::find_by_id(participant.user_id)
            .one(self.db)
            .await?
            .ok_or(Error::UserNotFound)?;

          let url = invoice_url(self.app_url, details.invoice.id);
          let delivered = self
            .mailer
            .send_invoice_reminder(
              &user.email,
              &user.name,
              &details.invoice.title,
              &url,
            )
            .await;

          if delivered {
            changes.push((participant.invoice_id, participant.user_id));
            report.sent += 1;
          } else {
            report.failed += 1;
          }
        }
        Some(_) => {}
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use async_trait::async_trait;
  use chrono::NaiveDate;

  use super::*;
  use crate::{policy::Actor, sv::test_utils::test_db};

  const APP_URL: &str = "https://split.example.com";

  #[derive(Default)]
  struct Recorder {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
  }

  impl Recorder {
    fn sent(&self) -> Vec<(String, String)> {
      self.sent.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl Mailer for Recorder {
    async fn send_invoice_reminder(
      &self,
      to: &str,
      _display_name: &str,
      _invoice_title: &str,
      invoice_url: &str,
    ) -> bool {
      if self.fail {
        return false;
      }
      self.sent.lock().unwrap().push((to.to_string(), invoice_url.to_string()));
      true
    }
  }

  fn start() -> DateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(9, 0, 0).unwrap()
  }

  async fn stored(
    db: &DatabaseConnection,
    invoice_id: Uuid,
    user_id: i64,
  ) -> participant::Model {
    participant::Entity::find_by_id((invoice_id, user_id))
      .one(db)
      .await
      .unwrap()
      .unwrap()
  }

  async fn set_last_reminder(
    db: &DatabaseConnection,
    invoice_id: Uuid,
    user_id: i64,
    at: DateTime,
  ) {
    let participant = stored(db, invoice_id, user_id).await;
    participant::ActiveModel {
      last_reminder_sent_at: Set(Some(at)),
      ..participant.into()
    }
    .update(db)
    .await
    .unwrap();
  }

  /// Invoice owned by 1 with participants 2 (A) and 3 (B, approved).
  async fn setup() -> (DatabaseConnection, Uuid) {
    let db = test_db::setup().await;
    for id in [1, 2, 3] {
      test_db::user(&db, id).await;
    }

    let details =
      sv::Invoice::new(&db).create(1, "Cabin", 300_00, &[2, 3]).await.unwrap();
    let id = details.invoice.id;

    sv::Approval::new(&db).approve(id, 3, &Actor::user(3)).await.unwrap();

    (db, id)
  }

  #[tokio::test]
  async fn test_first_sighting_starts_clock_without_email() {
    let (db, id) = setup().await;
    let mailer = Recorder::default();
    let now = start();

    let report =
      Reminder::new(&db, &mailer, APP_URL).sweep(now).await.unwrap();

    assert_eq!(report.initialized, 1);
    assert_eq!(report.sent, 0);
    assert!(mailer.sent().is_empty());
    assert_eq!(stored(&db, id, 2).await.last_reminder_sent_at, Some(now));
  }

  #[tokio::test]
  async fn test_approved_participant_is_never_reminded() {
    let (db, id) = setup().await;
    let mailer = Recorder::default();
    set_last_reminder(&db, id, 3, start() - TimeDelta::days(30)).await;

    let sv = Reminder::new(&db, &mailer, APP_URL);
    sv.sweep(start()).await.unwrap();
    sv.sweep(start() + TimeDelta::days(10)).await.unwrap();

    assert!(mailer.sent().iter().all(|(to, _)| to != "user3@example.com"));
    assert_eq!(
      stored(&db, id, 3).await.last_reminder_sent_at,
      Some(start() - TimeDelta::days(30))
    );
  }

  #[tokio::test]
  async fn test_debounce_window() {
    let (db, id) = setup().await;
    let mailer = Recorder::default();
    let sv = Reminder::new(&db, &mailer, APP_URL);

    set_last_reminder(&db, id, 2, start() - TimeDelta::days(1)).await;
    let report = sv.sweep(start()).await.unwrap();
    assert_eq!(report.changes(), 0);
    assert!(mailer.sent().is_empty());

    set_last_reminder(&db, id, 2, start() - TimeDelta::days(3)).await;
    let report = sv.sweep(start()).await.unwrap();
    assert_eq!(report.sent, 1);
    assert_eq!(
      mailer.sent(),
      vec![("user2@example.com".to_string(), invoice_url(APP_URL, id))]
    );
    assert_eq!(stored(&db, id, 2).await.last_reminder_sent_at, Some(start()));
  }

  #[tokio::test]
  async fn test_debounce_boundary_is_inclusive() {
    let (db, id) = setup().await;
    let mailer = Recorder::default();
    let sv = Reminder::new(&db, &mailer, APP_URL);
    let debounce = TimeDelta::hours(REMINDER_DEBOUNCE_HOURS);

    let almost = start() - debounce + TimeDelta::seconds(1);
    set_last_reminder(&db, id, 2, almost).await;
    let report = sv.sweep(start()).await.unwrap();
    assert_eq!(report.sent, 0);
    assert_eq!(stored(&db, id, 2).await.last_reminder_sent_at, Some(almost));

    set_last_reminder(&db, id, 2, start() - debounce).await;
    let report = sv.sweep(start()).await.unwrap();
    assert_eq!(report.sent, 1);
    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(stored(&db, id, 2).await.last_reminder_sent_at, Some(start()));
  }

  /// Removes `(invoice_id, user_id)` from the invoice while mailing `leaver`.
  struct LeavingMailer {
    db: DatabaseConnection,
    leaver: String,
    invoice_id: Uuid,
    user_id: i64,
    inner: Recorder,
  }

  #[async_trait]
  impl Mailer for LeavingMailer {
    async fn send_invoice_reminder(
      &self,
      to: &str,
      display_name: &str,
      invoice_title: &str,
      invoice_url: &str,
    ) -> bool {
      if to == self.leaver {
        participant::Entity::delete_by_id((self.invoice_id, self.user_id))
          .exec(&self.db)
          .await
          .unwrap();
      }
      self
        .inner
        .send_invoice_reminder(to, display_name, invoice_title, invoice_url)
        .await
    }
  }

  #[tokio::test]
  async fn test_participant_leaving_mid_sweep_keeps_other_stamps() {
    let db = test_db::setup().await;
    for id in [1, 2, 3] {
      test_db::user(&db, id).await;
    }
    let invoices = sv::Invoice::new(&db);
    let left = invoices.create(1, "Taxi", 30_00, &[2]).await.unwrap();
    let stays = invoices.create(1, "Hotel", 500_00, &[3]).await.unwrap();
    let (left, stays) = (left.invoice.id, stays.invoice.id);

    let last = start() - TimeDelta::days(3);
    set_last_reminder(&db, left, 2, last).await;
    set_last_reminder(&db, stays, 3, last).await;

    let mailer = LeavingMailer {
      db: db.clone(),
      leaver: "user2@example.com".into(),
      invoice_id: left,
      user_id: 2,
      inner: Recorder::default(),
    };
    let sv = Reminder::new(&db, &mailer, APP_URL);

    let report = sv.sweep(start()).await.unwrap();
    assert_eq!(report.sent, 2);
    assert_eq!(report.vanished, 1);
    assert_eq!(
      stored(&db, stays, 3).await.last_reminder_sent_at,
      Some(start())
    );

    // an hour later nobody is mailed again
    sv.sweep(start() + TimeDelta::hours(1)).await.unwrap();
    let mut sent: Vec<_> =
      mailer.inner.sent().into_iter().map(|(to, _)| to).collect();
    sent.sort();
    assert_eq!(sent, vec!["user2@example.com", "user3@example.com"]);
  }

  #[tokio::test]
  async fn test_failed_delivery_keeps_timestamp() {
    let (db, id) = setup().await;
    let mailer = Recorder { fail: true, ..Default::default() };
    let last = start() - TimeDelta::days(3);
    set_last_reminder(&db, id, 2, last).await;

    let report =
      Reminder::new(&db, &mailer, APP_URL).sweep(start()).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.changes(), 0);
    assert_eq!(stored(&db, id, 2).await.last_reminder_sent_at, Some(last));
  }

  #[tokio::test]
  async fn test_two_cycles_send_one_email() {
    let (db, id) = setup().await;
    let mailer = Recorder::default();
    let sv = Reminder::new(&db, &mailer, APP_URL);

    sv.sweep(start()).await.unwrap();
    assert_eq!(stored(&db, id, 2).await.last_reminder_sent_at, Some(start()));
    assert_eq!(stored(&db, id, 3).await.last_reminder_sent_at, None);

    let later = start() + TimeDelta::days(3);
    sv.sweep(later).await.unwrap();

    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(stored(&db, id, 2).await.last_reminder_sent_at, Some(later));
    assert_eq!(stored(&db, id, 3).await.last_reminder_sent_at, None);
  }

  #[tokio::test]
  async fn test_only_active_invoices_are_swept() {
    let (db, id) = setup().await;
    let mailer = Recorder::default();

    sv::Approval::new(&db).approve(id, 2, &Actor::user(2)).await.unwrap();
    sv::Invoice::new(&db)
      .transition(id, InvoiceStatus::Paying, &Actor::user(1))
      .await
      .unwrap();

    let report =
      Reminder::new(&db, &mailer, APP_URL).sweep(start()).await.unwrap();

    assert_eq!(report, SweepReport::default());
  }

  #[tokio::test]
  async fn test_broken_invoice_does_not_block_others() {
    let (db, broken) = setup().await;
    let mailer = Recorder::default();

    let healthy =
      sv::Invoice::new(&db).create(1, "Fuel", 40_00, &[3]).await.unwrap();
    let healthy = healthy.invoice.id;

    // participant without a user row
    db.execute_unprepared("PRAGMA foreign_keys = OFF").await.unwrap();
    let stale = start() - TimeDelta::days(5);
    participant::ActiveModel {
      invoice_id: Set(broken),
      user_id: Set(404),
      has_paid: Set(false),
      paid_at: Set(None),
      last_reminder_sent_at: Set(Some(stale)),
    }
    .insert(&db)
    .await
    .unwrap();
    set_last_reminder(&db, healthy, 3, stale).await;

    let report =
      Reminder::new(&db, &mailer, APP_URL).sweep(start()).await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(
      stored(&db, healthy, 3).await.last_reminder_sent_at,
      Some(start())
    );
  }

  #[test]
  fn test_invoice_url() {
    let id = Uuid::nil();
    assert_eq!(
      invoice_url(APP_URL, id),
      format!("https://split.example.com/invoices/{id}")
    );
  }
}
