//! # Shop Payment Engine
//!
//! The engine is the ledger at the heart of the shop payment gateway: every checkout attempt becomes a
//! `Pending` transaction row, and the provider's authoritative verdict later moves that row, exactly once, to
//! `Completed` (settling the cart) or `Failed`. The engine is provider-agnostic; it neither talks to payment
//! providers nor serves HTTP.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`], Sqlite-backed). You should never need to access the database
//!    directly; use the public API instead. The exception is the data types used in the database, defined in the
//!    public `db_types` module.
//! 2. The payment engine public API ([`PaymentFlowApi`]). A backend implements the traits in [`mod@traits`] to
//!    drive it; the server hands it a [`SqliteDatabase`].
mod db;

pub mod db_types;
mod spe_api;
pub mod traits;

pub use db::sqlite::SqliteDatabase;
pub use spe_api::{
    checkout_objects::{
        CheckoutQuote,
        PaymentConfirmation,
        ProviderVerdict,
        VerificationFailure,
        VerificationOutcome,
        CHECKOUT_TAX,
    },
    payment_flow_api::PaymentFlowApi,
};
pub use traits::{PaymentLedgerDatabase, PaymentLedgerError, SettlementStatus, StorefrontAccess};
