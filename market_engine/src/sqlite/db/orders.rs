use log::debug;
use market_common::Centavos;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{ListingId, NewOrder, Order, OrderId, OrderStatusType},
    flow_api::order_objects::OrderQueryFilter,
    traits::MarketplaceError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can
/// embed this call inside a transaction if you need to ensure atomicity, and pass `&mut tx` as the
/// connection argument. Orders are always born `pending`, which is the column default.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, MarketplaceError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                buyer_id,
                seller_id,
                listing_id,
                quantity,
                transaction_method,
                payment_method,
                buyer_requested_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.listing_id)
    .bind(order.quantity)
    .bind(order.transaction_method)
    .bind(order.payment_method)
    .bind(order.buyer_requested_price)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} inserted for listing {}", order.id, order.listing_id);
    Ok(order)
}

pub async fn fetch_order_by_id(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Counts the buyer's `pending` orders on the given listing.
pub async fn count_pending_for_buyer(
    listing_id: ListingId,
    buyer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE listing_id = $1 AND buyer_id = $2 AND status = 'pending'",
    )
    .bind(listing_id)
    .bind(buyer_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `placed_at` in descending order (newest first).
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(participant_id) = query.participant_id {
        where_clause.push("(buyer_id = ");
        where_clause.push_bind_unseparated(participant_id);
        where_clause.push_unseparated(" OR seller_id = ");
        where_clause.push_bind_unseparated(participant_id);
        where_clause.push_unseparated(")");
    }
    if let Some(listing_id) = query.listing_id {
        where_clause.push("listing_id = ");
        where_clause.push_bind_unseparated(listing_id);
    }
    if let Some(statuses) = query.status {
        if !statuses.is_empty() {
            where_clause.push("status IN (");
            let mut first = true;
            for status in statuses {
                if !first {
                    where_clause.push_unseparated(",");
                }
                where_clause.push_bind_unseparated(status);
                first = false;
            }
            where_clause.push_unseparated(")");
        }
    }
    if let Some(since) = query.since {
        where_clause.push("placed_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("placed_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY placed_at DESC, id DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ");
            builder.push_bind(offset);
        }
    }
    let orders = builder.build_query_as().fetch_all(conn).await?;
    Ok(orders)
}

/// Moves the order from `from` to `to` in a single conditional update. Returns `None` when the
/// order is no longer in the `from` status, which is how a concurrent transition on the same order
/// loses the race instead of clobbering the winner's write.
pub async fn update_status_checked(
    id: OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(id)
    .bind(from)
    // fetch_all drains the statement so that, when called outside an explicit transaction, the
    // autocommit has landed before this returns; `id` is unique so at most one row comes back.
    .fetch_all(conn)
    .await?
    .pop();
    Ok(order)
}

/// Moves a `confirmed` order to `completed`, locking in `price_at_purchase` in the same statement.
/// Returns `None` when the order is not `confirmed` anymore.
pub async fn complete_order(
    id: OrderId,
    final_price: Centavos,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'completed', price_at_purchase = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'confirmed'
            RETURNING *;
        "#,
    )
    .bind(final_price)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
