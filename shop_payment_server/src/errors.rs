use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use payment_providers::ProviderApiError;
use shop_payment_engine::PaymentLedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Authentication required. Supply a valid x-user-id header.")]
    Unauthenticated,
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The checkout cannot proceed. {0}")]
    CannotCheckout(String),
    #[error("Payment provider error. {0}")]
    ProviderError(#[from] ProviderApiError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CannotCheckout(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ProviderError(e) => provider_status_code(e),
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// A remote non-2xx answer keeps its status where it is a client error, so a provider complaining about a bad
/// request surfaces as that bad request. Everything else that went wrong between us and the provider is a bad
/// gateway. Signature and payload failures are client errors on the webhook endpoint.
fn provider_status_code(e: &ProviderApiError) -> StatusCode {
    match e {
        ProviderApiError::QueryError { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_GATEWAY),
        ProviderApiError::SignatureInvalid(_) => StatusCode::BAD_REQUEST,
        ProviderApiError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
        ProviderApiError::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
        ProviderApiError::Initialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ProviderApiError::RestResponseError(_) => StatusCode::BAD_GATEWAY,
        ProviderApiError::JsonError(_) => StatusCode::BAD_GATEWAY,
        ProviderApiError::Rejected(_) => StatusCode::BAD_GATEWAY,
        ProviderApiError::InvalidCurrencyAmount(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<PaymentLedgerError> for ServerError {
    fn from(e: PaymentLedgerError) -> Self {
        match &e {
            PaymentLedgerError::DatabaseError(msg) => Self::BackendError(msg.clone()),
            PaymentLedgerError::CartNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentLedgerError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentLedgerError::TransactionNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentLedgerError::CartAlreadyPaid(_) => Self::CannotCheckout(e.to_string()),
            PaymentLedgerError::CartEmpty(_) => Self::CannotCheckout(e.to_string()),
            PaymentLedgerError::TransactionAlreadyExists(_) => Self::BackendError(e.to_string()),
        }
    }
}
