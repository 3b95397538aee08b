//! The authentication boundary of the payment server.
//!
//! Identity is established upstream (the storefront's session layer); by the time a request reaches this server,
//! the authenticated account id travels in the `x-user-id` header. The extractor below makes that boundary
//! explicit: handlers that take an [`AuthenticatedUser`] cannot run without one, and requests without the header
//! are rejected with a 401 before any handler code executes. The full profile (email, username, phone) is
//! resolved from the store by the engine when it is needed.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::*;

use crate::errors::ServerError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The account behind an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(user_from_request(req))
    }
}

fn user_from_request(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let header = req.headers().get(USER_ID_HEADER).ok_or(ServerError::Unauthenticated)?;
    let id = header.to_str().ok().and_then(|s| s.trim().parse::<i64>().ok()).ok_or_else(|| {
        debug!("💻️ The {USER_ID_HEADER} header does not carry a valid account id");
        ServerError::Unauthenticated
    })?;
    Ok(AuthenticatedUser { id })
}
