use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The provider could not process the request: {0}")]
    Rejected(String),
    #[error("Webhook signature verification failed: {0}")]
    SignatureInvalid(String),
    #[error("Malformed webhook payload: {0}")]
    MalformedEvent(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
    #[error("Unsupported payment provider: {0}")]
    UnsupportedProvider(String),
}
