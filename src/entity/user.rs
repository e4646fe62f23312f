use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{invoice, participant};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i64,
  #[sea_orm(unique)]
  pub email: String,
  pub name: String,
  pub reg_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "invoice::Entity")]
  OwnedInvoices,
  #[sea_orm(has_many = "participant::Entity")]
  Participations,
}

impl Related<invoice::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::OwnedInvoices.def()
  }
}

impl Related<participant::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Participations.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
