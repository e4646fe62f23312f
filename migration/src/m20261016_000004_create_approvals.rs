use sea_orm_migration::prelude::*;

use super::{
  m20261016_000001_create_users::Users,
  m20261016_000002_create_invoices::Invoices,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Approvals::Table)
          .if_not_exists()
          .col(ColumnDef::new(Approvals::InvoiceId).uuid().not_null())
          .col(ColumnDef::new(Approvals::UserId).big_integer().not_null())
          .col(ColumnDef::new(Approvals::ApprovedAt).date_time().not_null())
          // one approval per (invoice, user)
          .primary_key(
            Index::create().col(Approvals::InvoiceId).col(Approvals::UserId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_approvals_invoice")
              .from(Approvals::Table, Approvals::InvoiceId)
              .to(Invoices::Table, Invoices::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_approvals_user")
              .from(Approvals::Table, Approvals::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Approvals::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Approvals {
  Table,
  InvoiceId,
  UserId,
  ApprovedAt,
}
