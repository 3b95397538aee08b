use crate::{
    db_types::{Cart, CartItem, UserProfile},
    traits::PaymentLedgerError,
};

/// Read access to the storefront entities the payment gateway consumes.
///
/// Carts, items and user profiles are owned by the storefront. The gateway reads them to price a checkout and to
/// fill in the customer details a provider wants, and the only write it ever performs against them is flipping
/// `carts.paid` inside [`settle_transaction`](crate::traits::PaymentLedgerDatabase::settle_transaction).
#[allow(async_fn_in_trait)]
pub trait StorefrontAccess: Clone {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<UserProfile>, PaymentLedgerError>;

    /// Fetches the cart with the given code, provided it belongs to the given user. A cart that exists but belongs
    /// to someone else is indistinguishable from one that does not exist.
    async fn fetch_cart_by_code(&self, cart_code: &str, user_id: i64) -> Result<Option<Cart>, PaymentLedgerError>;

    async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, PaymentLedgerError>;
}
