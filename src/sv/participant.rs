use sea_orm::sea_query::Expr;

use crate::{
  entity::{InvoiceStatus, approval, participant, user},
  policy::{self, Actor},
  prelude::*,
  sv::invoice::{find, require_status},
};

pub struct Participant<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Participant<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_invoice(
    &self,
    invoice_id: Uuid,
  ) -> Result<Vec<participant::Model>> {
    Ok(
      participant::Entity::find()
        .filter(participant::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(participant::Column::UserId)
        .all(self.db)
        .await?,
    )
  }

  /// Adding someone twice returns the existing row.
  pub async fn add(
    &self,
    invoice_id: Uuid,
    user_id: i64,
    actor: &Actor,
  ) -> Result<participant::Model> {
    let txn = self.db.begin().await?;

    let invoice = find(&txn, invoice_id).await?;
    require_status(&invoice, InvoiceStatus::Active, "change participants")?;

    if !policy::can_manage_invoice(actor, &invoice) {
      return Err(Error::Forbidden);
    }

    user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let existing =
      participant::Entity::find_by_id((invoice_id, user_id)).one(&txn).await?;
    if let Some(existing) = existing {
      return Ok(existing);
    }

    let participant = participant::ActiveModel {
      invoice_id: Set(invoice_id),
      user_id: Set(user_id),
      has_paid: Set(false),
      paid_at: Set(None),
      last_reminder_sent_at: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(participant)
  }

  /// Drops the participant together with their approval.
  pub async fn remove(
    &self,
    invoice_id: Uuid,
    user_id: i64,
    actor: &Actor,
  ) -> Result<()> {
    let txn = self.db.begin().await?;

    let invoice = find(&txn, invoice_id).await?;
    require_status(&invoice, InvoiceStatus::Active, "change participants")?;

    if !policy::can_manage_invoice(actor, &invoice) {
      return Err(Error::Forbidden);
    }

    let removed = participant::Entity::delete_by_id((invoice_id, user_id))
      .exec(&txn)
      .await?;
    if removed.rows_affected == 0 {
      return Err(Error::ParticipantNotFound);
    }

    approval::Entity::delete_by_id((invoice_id, user_id)).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
  }

  /// Flips the paid flag of `target_user_id` while the invoice collects
  /// payments. Calling it twice restores the original state.
  pub async fn toggle_payment(
    &self,
    invoice_id: Uuid,
    target_user_id: i64,
    actor: &Actor,
  ) -> Result<participant::Model> {
    let txn = self.db.begin().await?;

    let invoice = find(&txn, invoice_id).await?;
    require_status(&invoice, InvoiceStatus::Paying, "toggle payment status")?;

    if !policy::can_toggle_payment(actor, target_user_id) {
      return Err(Error::Forbidden);
    }

    let participants =
      invoice.find_related(participant::Entity).all(&txn).await?;

    let current = participants
      .iter()
      .find(|p| p.user_id == target_user_id)
      .ok_or(Error::ParticipantNotFound)?;

    let has_paid = !current.has_paid;
    let paid_at = has_paid.then(|| Utc::now().naive_utc());

    // guarded by the flag we read, a concurrent toggle leaves zero rows
    let result = participant::Entity::update_many()
      .col_expr(participant::Column::HasPaid, Expr::value(has_paid))
      .col_expr(participant::Column::PaidAt, Expr::value(paid_at))
      .filter(participant::Column::InvoiceId.eq(invoice_id))
      .filter(participant::Column::UserId.eq(target_user_id))
      .filter(participant::Column::HasPaid.eq(current.has_paid))
      .exec(&txn)
      .await?;

    if result.rows_affected == 0 && !participants.is_empty() {
      return Err(Error::PersistenceConflict);
    }

    txn.commit().await?;

    if actor.user_id != target_user_id {
      info!(
        "Admin {} set paid={} for user {} on invoice {}",
        actor.user_id, has_paid, target_user_id, invoice_id
      );
    } else {
      debug!(
        "User {} set paid={} on invoice {}",
        target_user_id, has_paid, invoice_id
      );
    }

    Ok(participant::Model { has_paid, paid_at, ..current.clone() })
  }
}
