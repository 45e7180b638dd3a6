use thiserror::Error;

use crate::{
    db_types::{ListingId, Order, OrderId},
    flow_api::order_objects::OrderQueryFilter,
};

/// Read-side access to orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order record, or `None` if it does not exist.
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderApiError>;

    /// Fetches orders according to the criteria in the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;

    /// Counts the buyer's `pending` orders on the given listing. Used to reject duplicate
    /// concurrent purchase attempts by the same buyer.
    async fn count_pending_orders_for_buyer(
        &self,
        listing_id: ListingId,
        buyer_id: i64,
    ) -> Result<i64, OrderApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Malformed order query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
