pub mod approval;
pub mod invoice;
pub mod participant;
pub mod user;

pub use invoice::InvoiceStatus;
