use sea_orm_migration::prelude::*;

use super::m20261016_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Invoices::Table)
          .if_not_exists()
          .col(ColumnDef::new(Invoices::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Invoices::OwnerId).big_integer().not_null())
          .col(ColumnDef::new(Invoices::Title).string().not_null())
          .col(
            ColumnDef::new(Invoices::Amount)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Invoices::Status)
              .text()
              .not_null()
              .default("active"),
          )
          .col(ColumnDef::new(Invoices::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_invoices_owner")
              .from(Invoices::Table, Invoices::OwnerId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // the reminder sweep scans by status every cycle
    manager
      .create_index(
        Index::create()
          .name("idx_invoices_status")
          .table(Invoices::Table)
          .col(Invoices::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Invoices::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Invoices {
  Table,
  Id,
  OwnerId,
  Title,
  Amount,
  Status,
  CreatedAt,
}
