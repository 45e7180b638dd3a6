use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Listing, ListingId, NewListing},
    traits::MarketplaceError,
};

pub async fn insert_listing(listing: NewListing, conn: &mut SqliteConnection) -> Result<Listing, MarketplaceError> {
    let listing = sqlx::query_as(
        r#"
            INSERT INTO listings (
                seller_id,
                name,
                status,
                total_stock,
                price_min,
                price_max,
                transaction_methods,
                payment_methods
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(listing.seller_id)
    .bind(listing.name)
    .bind(listing.status)
    .bind(listing.total_stock)
    .bind(listing.price_min)
    .bind(listing.price_max)
    .bind(listing.transaction_methods.to_string())
    .bind(listing.payment_methods.to_string())
    // fetch_all drains the statement so the autocommit transaction is committed — and the row
    // visible to other connections — before this returns; fetch_one would hand back the RETURNING
    // row while the worker thread is still stepping the statement to completion.
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(listing)
}

pub async fn fetch_listing(id: ListingId, conn: &mut SqliteConnection) -> Result<Option<Listing>, sqlx::Error> {
    let listing = sqlx::query_as("SELECT * FROM listings WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(listing)
}

/// Reserves `quantity` units on the listing with a single conditional update. The `WHERE` clause
/// rejects the reservation when tracked stock is too low, so two concurrent buyers can never both
/// take the last unit; the loser's update matches zero rows and surfaces as
/// [`MarketplaceError::InsufficientStock`].
///
/// A `NULL` `total_stock` means the listing is untracked and every reservation succeeds.
pub async fn reserve_stock(
    listing_id: ListingId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MarketplaceError> {
    let result = sqlx::query(
        r#"
            UPDATE listings SET
                sold_count = sold_count + $1,
                total_stock = CASE WHEN total_stock IS NULL THEN NULL ELSE total_stock - $1 END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND (total_stock IS NULL OR total_stock >= $1)
        "#,
    )
    .bind(quantity)
    .bind(listing_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        let listing = fetch_listing(listing_id, conn).await?.ok_or(MarketplaceError::ListingNotFound(listing_id))?;
        let available = listing.total_stock.unwrap_or_default();
        return Err(MarketplaceError::InsufficientStock { listing_id, available, requested: quantity });
    }
    debug!("🗃️ Reserved {quantity} unit(s) on listing {listing_id}");
    Ok(())
}

/// Credits a cancelled reservation back to the listing. The guards keep `sold_count` from going
/// negative; untracked stock stays `NULL`. The listing status is deliberately left alone, so a
/// listing the seller has archived is not resurrected by a cancellation.
pub async fn restore_stock(
    listing_id: ListingId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MarketplaceError> {
    sqlx::query(
        r#"
            UPDATE listings SET
                sold_count = CASE WHEN sold_count >= $1 THEN sold_count - $1 ELSE 0 END,
                total_stock = CASE WHEN total_stock IS NULL THEN NULL ELSE total_stock + $1 END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
        "#,
    )
    .bind(quantity)
    .bind(listing_id)
    .execute(conn)
    .await?;
    debug!("🗃️ Restored {quantity} unit(s) to listing {listing_id}");
    Ok(())
}

/// Flips an active listing to `sold_out` if its tracked stock has reached zero. Returns `true` if
/// the flip happened. No-op for untracked stock and for listings the seller has already paused or
/// archived.
pub async fn mark_sold_out_if_exhausted(
    listing_id: ListingId,
    conn: &mut SqliteConnection,
) -> Result<bool, MarketplaceError> {
    let result = sqlx::query(
        r#"
            UPDATE listings SET status = 'sold_out', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND total_stock = 0 AND status = 'active'
        "#,
    )
    .bind(listing_id)
    .execute(conn)
    .await?;
    let flipped = result.rows_affected() > 0;
    if flipped {
        debug!("🗃️ Listing {listing_id} is now sold out");
    }
    Ok(flipped)
}
