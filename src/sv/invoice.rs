use sea_orm::{LoaderTrait, PaginatorTrait, sea_query::Expr};

use crate::{
  entity::{InvoiceStatus, approval, invoice, participant, user},
  policy::{self, Actor},
  prelude::*,
};

/// Invoice row with its eager-loaded relations, ordered by user id.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDetails {
  pub invoice: invoice::Model,
  pub participants: Vec<participant::Model>,
  pub approvals: Vec<approval::Model>,
}

impl InvoiceDetails {
  pub fn approved_users(&self) -> HashSet<i64> {
    self.approvals.iter().map(|a| a.user_id).collect()
  }

  pub fn all_approved(&self) -> bool {
    let approved = self.approved_users();
    self.participants.iter().all(|p| approved.contains(&p.user_id))
  }

  pub fn all_paid(&self) -> bool {
    self.participants.iter().all(|p| p.has_paid)
  }
}

pub(crate) fn require_status(
  invoice: &invoice::Model,
  expected: InvoiceStatus,
  action: &'static str,
) -> Result<()> {
  if invoice.status != expected {
    return Err(Error::InvalidState { status: invoice.status, action });
  }
  Ok(())
}

pub(crate) async fn find<C: ConnectionTrait>(
  conn: &C,
  id: Uuid,
) -> Result<invoice::Model> {
  invoice::Entity::find_by_id(id).one(conn).await?.ok_or(Error::InvoiceNotFound)
}

async fn with_relations<C: ConnectionTrait>(
  conn: &C,
  invoices: Vec<invoice::Model>,
) -> Result<Vec<InvoiceDetails>> {
  let participants = invoices.load_many(participant::Entity, conn).await?;
  let approvals = invoices.load_many(approval::Entity, conn).await?;

  Ok(
    invoices
      .into_iter()
      .zip(participants)
      .zip(approvals)
      .map(|((invoice, mut participants), mut approvals)| {
        participants.sort_by_key(|p| p.user_id);
        approvals.sort_by_key(|a| a.user_id);
        InvoiceDetails { invoice, participants, approvals }
      })
      .collect(),
  )
}

pub struct Invoice<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Invoice<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    owner_id: i64,
    title: &str,
    amount: i64,
    participants: &[i64],
  ) -> Result<InvoiceDetails> {
    let title = title.trim();
    if title.is_empty() {
      return Err(Error::InvalidArgs("Title must not be empty".into()));
    }
    if amount < 0 {
      return Err(Error::InvalidArgs("Amount must not be negative".into()));
    }

    let mut user_ids = participants.to_vec();
    user_ids.sort_unstable();
    user_ids.dedup();

    let txn = self.db.begin().await?;

    user::Entity::find_by_id(owner_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let known = user::Entity::find()
      .filter(user::Column::Id.is_in(user_ids.iter().copied()))
      .count(&txn)
      .await?;
    if known != user_ids.len() as u64 {
      return Err(Error::UserNotFound);
    }

    let now = Utc::now().naive_utc();
    let invoice = invoice::ActiveModel {
      id: Set(Uuid::new_v4()),
      owner_id: Set(owner_id),
      title: Set(title.to_string()),
      amount: Set(amount),
      status: Set(InvoiceStatus::Active),
      created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let mut rows = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
      let row = participant::ActiveModel {
        invoice_id: Set(invoice.id),
        user_id: Set(user_id),
        has_paid: Set(false),
        paid_at: Set(None),
        last_reminder_sent_at: Set(None),
      }
      .insert(&txn)
      .await?;
      rows.push(row);
    }

    txn.commit().await?;

    info!(
      "Invoice {} \"{}\" created by {} with {} participant(s)",
      invoice.id,
      invoice.title,
      owner_id,
      rows.len()
    );

    Ok(InvoiceDetails { invoice, participants: rows, approvals: Vec::new() })
  }

  pub async fn details(&self, id: Uuid) -> Result<InvoiceDetails> {
    let invoice = find(self.db, id).await?;
    let mut details = with_relations(self.db, vec![invoice]).await?;
    details.pop().ok_or(Error::InvoiceNotFound)
  }

  pub async fn by_status(
    &self,
    status: InvoiceStatus,
  ) -> Result<Vec<InvoiceDetails>> {
    let invoices = invoice::Entity::find()
      .filter(invoice::Column::Status.eq(status))
      .order_by_asc(invoice::Column::CreatedAt)
      .all(self.db)
      .await?;

    with_relations(self.db, invoices).await
  }

  pub async fn by_participant(
    &self,
    user_id: i64,
  ) -> Result<Vec<invoice::Model>> {
    Ok(
      invoice::Entity::find()
        .inner_join(participant::Entity)
        .filter(participant::Column::UserId.eq(user_id))
        .order_by_desc(invoice::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Moves the invoice along Active -> Paying -> Paid.
  ///
  /// Collection opens once every participant approved; the invoice closes
  /// once every participant paid.
  pub async fn transition(
    &self,
    id: Uuid,
    next: InvoiceStatus,
    actor: &Actor,
  ) -> Result<invoice::Model> {
    let txn = self.db.begin().await?;

    let invoice = find(&txn, id).await?;
    let status = invoice.status;
    let action = match next {
      InvoiceStatus::Active => "reopen invoice",
      InvoiceStatus::Paying => "start payment collection",
      InvoiceStatus::Paid => "mark invoice paid",
    };

    if !status.can_transition_to(next) {
      return Err(Error::InvalidState { status, action });
    }

    if !policy::can_manage_invoice(actor, &invoice) {
      return Err(Error::Forbidden);
    }

    let details = with_relations(&txn, vec![invoice])
      .await?
      .pop()
      .ok_or(Error::InvoiceNotFound)?;

    let ready = match next {
      InvoiceStatus::Paying => {
        !details.participants.is_empty() && details.all_approved()
      }
      InvoiceStatus::Paid => details.all_paid(),
      InvoiceStatus::Active => false,
    };
    if !ready {
      return Err(Error::InvalidState { status, action });
    }

    let result = invoice::Entity::update_many()
      .col_expr(invoice::Column::Status, Expr::value(next))
      .filter(invoice::Column::Id.eq(id))
      .filter(invoice::Column::Status.eq(status))
      .exec(&txn)
      .await?;

    if result.rows_affected == 0 {
      return Err(Error::PersistenceConflict);
    }

    txn.commit().await?;

    info!("Invoice {} moved {} -> {} by {}", id, status, next, actor.user_id);

    Ok(invoice::Model { status: next, ..details.invoice })
  }
}
