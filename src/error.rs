use sea_orm::DbErr;

use crate::entity::InvoiceStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Invoice not found")]
  InvoiceNotFound,
  #[error("User is not a participant of this invoice")]
  ParticipantNotFound,
  #[error("User not found")]
  UserNotFound,
  #[error("Cannot {action} while invoice is {status}")]
  InvalidState { status: InvoiceStatus, action: &'static str },
  #[error("Not allowed")]
  Forbidden,
  #[error("Invoice was modified concurrently, nothing was saved")]
  PersistenceConflict,
  #[error("Invalid arguments: {0}")]
  InvalidArgs(String),
  #[error("Mail relay: {0}")]
  Mail(String),
  #[error("Database: {0}")]
  Db(#[from] DbErr),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
