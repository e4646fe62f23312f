use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{approval, participant, user};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum InvoiceStatus {
  #[sea_orm(string_value = "active")]
  #[default]
  Active,
  #[sea_orm(string_value = "paying")]
  Paying,
  #[sea_orm(string_value = "paid")]
  Paid,
}

impl InvoiceStatus {
  /// Edges of the lifecycle: Active -> Paying -> Paid.
  pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
    matches!(
      (self, next),
      (InvoiceStatus::Active, InvoiceStatus::Paying)
        | (InvoiceStatus::Paying, InvoiceStatus::Paid)
    )
  }
}

impl fmt::Display for InvoiceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      InvoiceStatus::Active => "active",
      InvoiceStatus::Paying => "paying",
      InvoiceStatus::Paid => "paid",
    })
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub owner_id: i64,
  pub title: String,
  /// Total in cents.
  pub amount: i64,
  pub status: InvoiceStatus,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::OwnerId",
    to = "user::Column::Id"
  )]
  Owner,
  #[sea_orm(has_many = "participant::Entity")]
  Participants,
  #[sea_orm(has_many = "approval::Entity")]
  Approvals,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Owner.def()
  }
}

impl Related<participant::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Participants.def()
  }
}

impl Related<approval::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Approvals.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
