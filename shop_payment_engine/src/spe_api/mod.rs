//! # Shop payment engine public API
//!
//! The `spe_api` module exposes the programmatic API for the shop payment engine. An API instance is created by
//! supplying a database backend that implements the backend traits in [`crate::traits`].
//!
//! * [`payment_flow_api`] is the primary API for pricing checkouts, recording pending payment attempts, and
//!   reconciling the provider's authoritative verdict against the ledger.
//! * [`checkout_objects`] holds the value types that flow through that API.
//!
//! ```rust,ignore
//! use shop_payment_engine::{PaymentFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = PaymentFlowApi::new(db);
//! let quote = api.prepare_checkout("4f2b9c", user_id).await?;
//! ```
pub mod checkout_objects;
pub mod payment_flow_api;
