//! # Database backend contracts.
//!
//! This module defines the behaviour a database backend must expose in order to act as the ledger for the shop
//! payment gateway.
//!
//! * [`StorefrontAccess`] is the read-only view of the storefront entities the gateway consumes: user profiles,
//!   carts and their items. The gateway never creates or edits these records.
//! * [`PaymentLedgerDatabase`] is the ledger itself: recording a pending transaction when a remote session opens,
//!   and applying the terminal transitions once the provider's verdict is in. Settling a transaction and marking
//!   its cart paid happen in one atomic unit, and both terminal transitions are conditional on the row still being
//!   `Pending`, which is what makes redelivered notifications and racing observers safe.
mod data_objects;
mod payment_ledger_database;
mod storefront_access;

pub use data_objects::SettlementStatus;
pub use payment_ledger_database::{PaymentLedgerDatabase, PaymentLedgerError};
pub use storefront_access::StorefrontAccess;
