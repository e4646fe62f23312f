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
          .table(InvoiceParticipants::Table)
          .if_not_exists()
          .col(ColumnDef::new(InvoiceParticipants::InvoiceId).uuid().not_null())
          .col(
            ColumnDef::new(InvoiceParticipants::UserId)
              .big_integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(InvoiceParticipants::HasPaid)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(InvoiceParticipants::PaidAt).date_time().null())
          .col(
            ColumnDef::new(InvoiceParticipants::LastReminderSentAt)
              .date_time()
              .null(),
          )
          .primary_key(
            Index::create()
              .col(InvoiceParticipants::InvoiceId)
              .col(InvoiceParticipants::UserId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_invoice_participants_invoice")
              .from(InvoiceParticipants::Table, InvoiceParticipants::InvoiceId)
              .to(Invoices::Table, Invoices::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_invoice_participants_user")
              .from(InvoiceParticipants::Table, InvoiceParticipants::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_invoice_participants_user")
          .table(InvoiceParticipants::Table)
          .col(InvoiceParticipants::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(InvoiceParticipants::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum InvoiceParticipants {
  Table,
  InvoiceId,
  UserId,
  HasPaid,
  PaidAt,
  LastReminderSentAt,
}
