//! Authorization decisions for invoice commands.
//!
//! Every command receives an [`Actor`] built by the host and asks one of the
//! functions below instead of threading "is admin" flags through payloads.

use crate::{entity::invoice, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
  Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
  pub user_id: i64,
  pub capabilities: HashSet<Capability>,
}

impl Actor {
  pub fn user(user_id: i64) -> Self {
    Self { user_id, capabilities: HashSet::new() }
  }

  pub fn admin(user_id: i64) -> Self {
    Self { user_id, capabilities: HashSet::from([Capability::Admin]) }
  }

  pub fn has(&self, capability: Capability) -> bool {
    self.capabilities.contains(&capability)
  }

  pub fn is_admin(&self) -> bool {
    self.has(Capability::Admin)
  }
}

/// Participants toggle their own payment flag; admins toggle anyone's.
pub fn can_toggle_payment(actor: &Actor, target_user_id: i64) -> bool {
  actor.user_id == target_user_id || actor.is_admin()
}

/// Participant list and status changes belong to the invoice owner.
pub fn can_manage_invoice(actor: &Actor, invoice: &invoice::Model) -> bool {
  actor.user_id == invoice.owner_id || actor.is_admin()
}

/// Nobody approves on behalf of someone else, admins included.
pub fn can_approve(actor: &Actor, target_user_id: i64) -> bool {
  actor.user_id == target_user_id
}
