//! Concurrency tests for stock reservation. Many buyers hammer the same listing at once; the
//! conditional reservation update must hand out exactly the available stock and not one unit more.
mod support;

use log::*;
use market_engine::{
    db_types::{OrderStatusType, PaymentMethod, TransactionMethod},
    order_objects::PlaceOrderRequest,
    traits::MarketplaceDatabase,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use support::{calculator, new_test_db, seed_listing};
use tokio::runtime::Runtime;

const NUM_BUYERS: i64 = 12;
const STOCK: i64 = 5;

#[test]
fn burst_orders() {
    info!("🚀️ Starting order burst test");
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let listing = seed_listing(&db, calculator(STOCK)).await;

        let mut handles = Vec::new();
        for i in 0..NUM_BUYERS {
            let db = db.clone();
            let listing_id = listing.id;
            handles.push(tokio::spawn(async move {
                let api = OrderFlowApi::new(db);
                // Buyer ids start above the seller's.
                let buyer_id = 100 + i;
                let request = PlaceOrderRequest::new(listing_id, 1, TransactionMethod::Online, PaymentMethod::Gcash);
                api.place_order(buyer_id, request).await
            }));
        }

        let mut placed = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.expect("task panicked") {
                Ok(order) => {
                    assert_eq!(order.status, OrderStatusType::Pending);
                    placed += 1;
                },
                Err(OrderFlowError::InsufficientStock { .. }) => rejected += 1,
                Err(e) => panic!("Unexpected error placing order: {e}"),
            }
        }
        info!("🚀️ {placed} orders placed, {rejected} rejected");
        assert_eq!(placed, STOCK);
        assert_eq!(rejected, NUM_BUYERS - STOCK);

        let listing = db.fetch_listing(listing.id).await.unwrap().unwrap();
        assert_eq!(listing.total_stock, Some(0));
        assert_eq!(listing.sold_count, STOCK);
    });
    info!("🚀️ test complete");
}

#[test]
fn two_buyers_race_for_the_last_unit() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let listing = seed_listing(&db, calculator(1)).await;

        let listing_id = listing.id;
        let race = |db: SqliteDatabase, buyer_id: i64| async move {
            let api = OrderFlowApi::new(db);
            let request = PlaceOrderRequest::new(listing_id, 1, TransactionMethod::Online, PaymentMethod::Gcash);
            api.place_order(buyer_id, request).await
        };
        let (a, b) = tokio::join!(race(db.clone(), 100), race(db.clone(), 101));

        let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one buyer wins the last unit: {a:?} / {b:?}");
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser.unwrap_err(), OrderFlowError::InsufficientStock { .. }));

        let listing = db.fetch_listing(listing.id).await.unwrap().unwrap();
        assert_eq!(listing.total_stock, Some(0));
        assert_eq!(listing.sold_count, 1);
    });
}
