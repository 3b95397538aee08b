//! HTTP clients for the two payment providers the storefront supports, plus a uniform [`PaymentGateways`] trait so
//! the rest of the system stays provider-agnostic.
//!
//! Flutterwave drives the redirect-style flow: the shopper is sent to a hosted payment link and returns via a
//! callback URL carrying a transaction id, which must then be verified server-to-server. Stripe drives the hosted
//! checkout flow: a checkout session is created up front and its authoritative state is either retrieved on the
//! success page or pushed asynchronously through a signed webhook.
//!
//! Nothing in this crate touches the transaction ledger. It only speaks to the remote APIs and normalizes their
//! answers into [`VerifiedPayment`] records for the reconciliation layer to act on.

mod config;
mod error;
mod flutterwave;
mod gateway;
mod stripe;

mod data_objects;

pub use config::{FlutterwaveConfig, StripeConfig};
pub use data_objects::{
    CheckoutCustomer,
    PaymentSession,
    Provider,
    ProviderPaymentStatus,
    SessionRequest,
    VerifiedPayment,
    WebhookEvent,
};
pub use error::ProviderApiError;
pub use flutterwave::FlutterwaveApi;
pub use gateway::{GatewayAdapter, PaymentGateways};
pub use stripe::StripeApi;
