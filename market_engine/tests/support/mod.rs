//! Shared scaffolding for the integration tests: a fresh migrated database per test, plus listing
//! fixtures.
#![allow(dead_code)]
use std::path::Path;

use log::*;
use market_common::Centavos;
use market_engine::{
    db_types::{Listing, NewListing, PaymentMethod, TransactionMethod},
    SqliteDatabase,
};
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

pub const SELLER: i64 = 1;
pub const BUYER: i64 = 2;
pub const OTHER_BUYER: i64 = 3;
pub const STRANGER: i64 = 99;

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    format!("sqlite://{}/market_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

/// Spins up a fresh, migrated database at a random path and returns a handle to it.
pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

/// A fixed-price listing with tracked stock, accepting all methods.
pub fn calculator(stock: i64) -> NewListing {
    NewListing::new(SELLER, "Scientific calculator", Centavos::from_pesos(350))
        .with_stock(stock)
        .with_transaction_methods(vec![TransactionMethod::MeetUp, TransactionMethod::Online])
        .with_payment_methods(vec![PaymentMethod::Cash, PaymentMethod::Gcash])
}

/// A range-priced listing (100 to 200 pesos) with tracked stock.
pub fn textbook(stock: i64) -> NewListing {
    NewListing::new(SELLER, "Calculus textbook, 9th ed", Centavos::from_pesos(100))
        .with_stock(stock)
        .with_price_range(Centavos::from_pesos(100), Centavos::from_pesos(200))
        .with_transaction_methods(vec![TransactionMethod::MeetUp])
        .with_payment_methods(vec![PaymentMethod::Cash, PaymentMethod::Gcash])
}

pub async fn seed_listing(db: &SqliteDatabase, listing: NewListing) -> Listing {
    db.insert_listing(listing).await.expect("Error seeding listing")
}
