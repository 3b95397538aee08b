use std::path::Path;

use log::*;
use shop_payment_engine::SqliteDatabase;
use spg_common::Cents;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

/// Creates a fresh database at the given url, runs the migrations, and returns a connected handle.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await
}

pub fn random_db_path() -> String {
    format!("sqlite://{}/spg_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) -> SqliteDatabase {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/db/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

//--------------------------------------    Storefront seeds   -------------------------------------------------------
// The storefront owns users, carts and items, so tests seed them with raw SQL rather than through the engine.

pub async fn seed_user(db: &SqliteDatabase, username: &str, email: &str, phone: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username, email, phone) VALUES ($1, $2, $3) RETURNING id")
        .bind(username)
        .bind(email)
        .bind(phone)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding user")
}

pub async fn seed_cart(db: &SqliteDatabase, cart_code: &str, user_id: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO carts (cart_code, user_id) VALUES ($1, $2) RETURNING id")
        .bind(cart_code)
        .bind(user_id)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding cart")
}

pub async fn seed_cart_item(db: &SqliteDatabase, cart_id: i64, name: &str, quantity: i64, unit_price: Cents) {
    sqlx::query("INSERT INTO cart_items (cart_id, product_name, quantity, unit_price) VALUES ($1, $2, $3, $4)")
        .bind(cart_id)
        .bind(name)
        .bind(quantity)
        .bind(unit_price)
        .execute(db.pool())
        .await
        .expect("Error seeding cart item");
}

pub async fn force_cart_paid(db: &SqliteDatabase, cart_id: i64) {
    sqlx::query("UPDATE carts SET paid = 1 WHERE id = $1")
        .bind(cart_id)
        .execute(db.pool())
        .await
        .expect("Error forcing cart paid");
}

pub async fn cart_is_paid(db: &SqliteDatabase, cart_id: i64) -> bool {
    sqlx::query_scalar("SELECT paid FROM carts WHERE id = $1")
        .bind(cart_id)
        .fetch_one(db.pool())
        .await
        .expect("Error reading cart paid flag")
}
