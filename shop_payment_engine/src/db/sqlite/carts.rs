use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Cart, CartItem};

/// Fetches a cart by its public code, scoped to the owning user. Someone else's cart code returns `None`.
pub async fn fetch_cart_by_code(
    cart_code: &str,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Cart>, sqlx::Error> {
    let cart = sqlx::query_as("SELECT * FROM carts WHERE cart_code = $1 AND user_id = $2")
        .bind(cart_code)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(cart)
}

pub async fn fetch_cart_by_id(cart_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    let cart = sqlx::query_as("SELECT * FROM carts WHERE id = $1").bind(cart_id).fetch_optional(conn).await?;
    Ok(cart)
}

pub async fn fetch_cart_items(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY id ASC")
        .bind(cart_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Marks the cart as paid. Only ever called from inside the settlement transaction, so that the cart flips in
/// the same atomic unit as the ledger row.
pub(crate) async fn mark_cart_paid(cart_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let _ = sqlx::query("UPDATE carts SET paid = 1 WHERE id = $1").bind(cart_id).execute(conn).await?;
    debug!("🛒️ Cart #{cart_id} marked as paid");
    Ok(())
}
