use std::fmt::Display;

use chrono::{DateTime, Utc};
use market_common::Centavos;
use serde::{Deserialize, Serialize};

use crate::db_types::{ListingId, OrderStatusType, PaymentMethod, TransactionMethod};

//--------------------------------------  PlaceOrderRequest   --------------------------------------------------------
/// A buyer's purchase request, as received from the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub listing_id: ListingId,
    pub quantity: i64,
    pub transaction_method: TransactionMethod,
    pub payment_method: PaymentMethod,
    /// A price offer within the listing's negotiable range. Only legal on range-priced listings.
    pub requested_price: Option<Centavos>,
}

impl PlaceOrderRequest {
    pub fn new(
        listing_id: ListingId,
        quantity: i64,
        transaction_method: TransactionMethod,
        payment_method: PaymentMethod,
    ) -> Self {
        Self { listing_id, quantity, transaction_method, payment_method, requested_price: None }
    }

    pub fn with_requested_price(mut self, price: Centavos) -> Self {
        self.requested_price = Some(price);
        self
    }
}

//--------------------------------------   OrderQueryFilter   --------------------------------------------------------
/// Criteria for searching orders. An empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    /// Matches orders where the user is either the buyer or the seller.
    pub participant_id: Option<i64>,
    pub listing_id: Option<ListingId>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_participant_id(mut self, user_id: i64) -> Self {
        self.participant_id = Some(user_id);
        self
    }

    pub fn with_listing_id(mut self, listing_id: ListingId) -> Self {
        self.listing_id = Some(listing_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn paged(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    pub fn is_empty(&self) -> bool {
        // An empty status list constrains nothing, so it must not count as a filter; the query
        // builder would otherwise emit a WHERE clause with no predicate behind it.
        self.buyer_id.is_none()
            && self.seller_id.is_none()
            && self.participant_id.is_none()
            && self.listing_id.is_none()
            && self.status.as_deref().map_or(true, <[_]>::is_empty)
            && self.since.is_none()
            && self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(buyer_id) = self.buyer_id {
            write!(f, "buyer_id: {buyer_id}. ")?;
        }
        if let Some(seller_id) = self.seller_id {
            write!(f, "seller_id: {seller_id}. ")?;
        }
        if let Some(participant_id) = self.participant_id {
            write!(f, "participant_id: {participant_id}. ")?;
        }
        if let Some(listing_id) = self.listing_id {
            write!(f, "listing_id: {listing_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}
