use market_common::Centavos;
use thiserror::Error;

use crate::{
    db_types::{ListingId, OrderId, OrderStatusType, Party, PaymentMethod, TransactionMethod},
    traits::{MarketplaceError, MeetupApiError, OrderApiError},
};

/// The caller-facing failure taxonomy for the flow APIs.
///
/// Every variant maps onto a stable code via [`OrderFlowError::error_code`], which the transport
/// layer translates to a status code. All variants are recoverable; none crash the process, and
/// every failing precondition short-circuits before any mutation.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Listing {0} does not exist")]
    ListingNotFound(ListingId),
    #[error("Listing {0} is not available for purchase")]
    ListingNotAvailable(ListingId),
    #[error("You cannot purchase your own listing")]
    SelfPurchase,
    #[error("Order quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },
    #[error("Transaction method {0} is not offered by this listing")]
    InvalidTransactionMethod(TransactionMethod),
    #[error("Payment method {0} is not offered by this listing")]
    InvalidPaymentMethod(PaymentMethod),
    #[error("You already have a pending order on listing {0}")]
    DuplicatePendingOrder(ListingId),
    #[error("This listing has a fixed price; a requested price is not applicable")]
    PriceNotNegotiable,
    #[error("Requested price {requested} is outside the listing's range [{min}, {max}]")]
    PriceOutOfRange { requested: Centavos, min: Centavos, max: Centavos },
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("You are not a party to this order")]
    AccessDenied,
    #[error("Only the {required} may move an order from {from} to {to}")]
    RoleNotPermitted { required: Party, from: OrderStatusType, to: OrderStatusType },
    #[error("Order status cannot change from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} was modified concurrently; re-fetch and retry")]
    OrderStateChanged(OrderId),
    #[error("No meetup exists for order {0}")]
    MeetupNotFound(OrderId),
    #[error("A meetup already exists for order {0}; use update instead")]
    MeetupAlreadyExists(OrderId),
    #[error("The meetup version you acted on is no longer current")]
    MeetupNotCurrent,
    #[error("The meetup for order {0} has been cancelled")]
    MeetupCancelled(OrderId),
    #[error("Order {0} does not use the meet-up transaction method")]
    MeetupNotRequired(OrderId),
    #[error("No fields to update")]
    EmptyUpdate,
    #[error("Internal error: {0}")]
    Database(String),
}

impl OrderFlowError {
    /// The stable caller-facing code for this error. The transport layer maps these to status
    /// codes; the strings themselves never change once published.
    pub fn error_code(&self) -> &'static str {
        use OrderFlowError::*;
        match self {
            ListingNotFound(_) | OrderNotFound(_) | MeetupNotFound(_) => "NOT_FOUND",
            AccessDenied => "ACCESS_DENIED",
            SelfPurchase | RoleNotPermitted { .. } => "FORBIDDEN",
            InvalidTransition { .. } => "INVALID_TRANSITION",
            InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            InvalidTransactionMethod(_) | InvalidPaymentMethod(_) | MeetupNotRequired(_) => "INVALID_METHOD",
            PriceNotNegotiable | PriceOutOfRange { .. } => "INVALID_PRICE_REQUEST",
            InvalidQuantity(_) => "INVALID_QUANTITY",
            ListingNotAvailable(_)
            | DuplicatePendingOrder(_)
            | OrderStateChanged(_)
            | MeetupAlreadyExists(_)
            | MeetupNotCurrent
            | MeetupCancelled(_)
            | EmptyUpdate => "CONFLICT",
            Database(_) => "INTERNAL",
        }
    }
}

impl From<MarketplaceError> for OrderFlowError {
    fn from(e: MarketplaceError) -> Self {
        match e {
            MarketplaceError::ListingNotFound(id) => OrderFlowError::ListingNotFound(id),
            MarketplaceError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            MarketplaceError::InsufficientStock { available, requested, .. } => {
                OrderFlowError::InsufficientStock { available, requested }
            },
            MarketplaceError::StaleOrderStatus(id, _) => OrderFlowError::OrderStateChanged(id),
            MarketplaceError::DatabaseError(msg) => OrderFlowError::Database(msg),
        }
    }
}

impl From<OrderApiError> for OrderFlowError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            OrderApiError::DatabaseError(msg) | OrderApiError::QueryError(msg) => OrderFlowError::Database(msg),
        }
    }
}

impl From<MeetupApiError> for OrderFlowError {
    fn from(e: MeetupApiError) -> Self {
        match e {
            MeetupApiError::ChainAlreadyExists(id) => OrderFlowError::MeetupAlreadyExists(id),
            MeetupApiError::NoMeetupForOrder(id) => OrderFlowError::MeetupNotFound(id),
            MeetupApiError::VersionNotCurrent(_) => OrderFlowError::MeetupNotCurrent,
            MeetupApiError::DatabaseError(msg) => OrderFlowError::Database(msg),
        }
    }
}
