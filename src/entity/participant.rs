use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{invoice, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_participants")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub invoice_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub user_id: i64,
  pub has_paid: bool,
  /// Set iff `has_paid`.
  pub paid_at: Option<DateTime>,
  pub last_reminder_sent_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "invoice::Entity",
    from = "Column::InvoiceId",
    to = "invoice::Column::Id",
    on_delete = "Cascade"
  )]
  Invoice,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id"
  )]
  User,
}

impl Related<invoice::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Invoice.def()
  }
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
