use crate::{
  entity::{InvoiceStatus, approval, participant},
  policy::{self, Actor},
  prelude::*,
  sv::invoice::{find, require_status},
};

pub struct Approval<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Approval<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Records that `user_id` accepts the invoice. Approving again is a no-op
  /// returning the first approval.
  pub async fn approve(
    &self,
    invoice_id: Uuid,
    user_id: i64,
    actor: &Actor,
  ) -> Result<approval::Model> {
    if !policy::can_approve(actor, user_id) {
      return Err(Error::Forbidden);
    }

    let txn = self.db.begin().await?;

    let invoice = find(&txn, invoice_id).await?;
    require_status(&invoice, InvoiceStatus::Active, "approve")?;

    participant::Entity::find_by_id((invoice_id, user_id))
      .one(&txn)
      .await?
      .ok_or(Error::ParticipantNotFound)?;

    if let Some(existing) =
      approval::Entity::find_by_id((invoice_id, user_id)).one(&txn).await?
    {
      return Ok(existing);
    }

    let approval = approval::ActiveModel {
      invoice_id: Set(invoice_id),
      user_id: Set(user_id),
      approved_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!("User {} approved invoice {}", user_id, invoice_id);
    Ok(approval)
  }

  pub async fn by_invoice(
    &self,
    invoice_id: Uuid,
  ) -> Result<Vec<approval::Model>> {
    Ok(
      approval::Entity::find()
        .filter(approval::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(approval::Column::UserId)
        .all(self.db)
        .await?,
    )
  }
}
