pub mod approval;
pub mod invoice;
pub mod mail;
pub mod participant;
pub mod reminder;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use approval::Approval;
pub use invoice::{Invoice, InvoiceDetails};
pub use mail::Mailer;
pub use participant::Participant;
pub use reminder::{Reminder, SweepReport};
pub use user::User;
