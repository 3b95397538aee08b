//! # Shop payment server
//! This crate hosts the HTTP surface of the shop payment gateway. It is responsible for:
//! Accepting checkout initiation requests from the storefront.
//! Receiving payment notifications from the two providers (redirect callbacks, success-page hits, and signed
//! webhooks) and handing them to the reconciliation engine.
//! Translating engine and provider outcomes into the `{message, subMessage}` responses the front end renders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payments/initiate`: Opens a remote payment session for a cart.
//! * `/payments/callback`: The redirect-provider confirmation endpoint.
//! * `/payments/success`, `/payments/canceled`, `/payments/webhook`: The hosted-checkout provider's endpoints.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
