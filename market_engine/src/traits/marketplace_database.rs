use market_common::Centavos;
use thiserror::Error;

use crate::{
    db_types::{Listing, ListingId, NewOrder, Order, OrderId, OrderStatusType},
    traits::{MeetupManagement, OrderManagement},
};

/// The top-level mutation contract for marketplace engine backends.
///
/// This behaviour includes:
/// * Reading listings on behalf of placement validation.
/// * Creating orders, with stock reserved in the same atomic unit as the order insert.
/// * Driving the order status transitions that carry side effects: cancellation restores stock,
///   completion locks the final price and flips exhausted listings to `sold_out`.
///
/// Callers are expected to have validated preconditions through [`crate::OrderFlowApi`] before
/// invoking the mutation methods; the backend still re-checks anything that is race-sensitive
/// (stock levels, the from-status of a transition) as part of its conditional updates.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderManagement + MeetupManagement {
    /// The URL of the backing database.
    fn url(&self) -> &str;

    /// Fetches the listing record, or `None` if it does not exist.
    async fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, MarketplaceError>;

    /// Takes a new order and, in a single atomic transaction:
    /// * reserves stock on the listing via a conditional update (`sold_count += quantity`, and
    ///   `total_stock -= quantity` when stock is tracked). Two concurrent reservations against the
    ///   last unit must not both succeed; the loser fails with [`MarketplaceError::InsufficientStock`].
    /// * inserts the order row with `pending` status.
    ///
    /// Returns the stored order.
    async fn create_order(&self, order: NewOrder) -> Result<Order, MarketplaceError>;

    /// Transitions the order from `pending` to `confirmed`. No side effect beyond the status write.
    ///
    /// The update is conditional on the order still being `pending`; a concurrent transition
    /// surfaces as [`MarketplaceError::StaleOrderStatus`].
    async fn confirm_order(&self, order: &Order) -> Result<Order, MarketplaceError>;

    /// Transitions the order to `cancelled` and, in the same transaction, credits the reserved
    /// quantity back to the listing (`sold_count -= quantity`, `total_stock += quantity` when
    /// tracked). Restoration never touches the listing status, so a manually archived listing is
    /// not resurrected.
    async fn cancel_order(&self, order: &Order) -> Result<Order, MarketplaceError>;

    /// Transitions the order from `confirmed` to `completed`, writing `price_at_purchase` in the
    /// same statement, and flips the listing to `sold_out` when its tracked stock is now zero.
    async fn complete_order(&self, order: &Order, final_price: Centavos) -> Result<Order, MarketplaceError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Listing {0} does not exist")]
    ListingNotFound(ListingId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Insufficient stock on listing {listing_id}: available {available}, requested {requested}")]
    InsufficientStock { listing_id: ListingId, available: i64, requested: i64 },
    #[error("Order {0} is no longer in {1} status")]
    StaleOrderStatus(OrderId, OrderStatusType),
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}
