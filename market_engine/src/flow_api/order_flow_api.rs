use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{ListingStatus, NewOrder, Order, OrderId, OrderStatusType},
    flow_api::{
        errors::OrderFlowError,
        order_objects::{OrderQueryFilter, PlaceOrderRequest},
        transitions::{transition_rule, TransitionEffect},
    },
    traits::MarketplaceDatabase,
};

/// `OrderFlowApi` is the primary API for placing orders and driving them through the status state
/// machine, with inventory reservation and restoration handled at the correct points.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Places a new order on behalf of `buyer_id`.
    ///
    /// The preconditions are checked in order, each a distinct failure, and the first failing one
    /// short-circuits with no state change:
    /// 1. The listing exists.
    /// 2. The listing is `active`.
    /// 3. The buyer is not the seller.
    /// 4. Tracked stock covers the requested quantity.
    /// 5. The transaction and payment methods are offered by the listing.
    /// 6. The buyer has no other `pending` order on the same listing.
    /// 7. A requested price is only accepted on a range-priced listing, and must lie within the
    ///    range.
    ///
    /// On success, stock is reserved optimistically as part of order creation — not deferred to
    /// confirmation — and the order is stored with `pending` status. Placing a meet-up order does
    /// NOT auto-create a meetup; the parties negotiate details first and call
    /// [`crate::MeetupApi::create_meetup`] explicitly.
    pub async fn place_order(&self, buyer_id: i64, request: PlaceOrderRequest) -> Result<Order, OrderFlowError> {
        if request.quantity < 1 {
            return Err(OrderFlowError::InvalidQuantity(request.quantity));
        }
        let listing = self
            .db
            .fetch_listing(request.listing_id)
            .await?
            .ok_or(OrderFlowError::ListingNotFound(request.listing_id))?;
        if listing.status != ListingStatus::Active {
            return Err(OrderFlowError::ListingNotAvailable(listing.id));
        }
        if listing.seller_id == buyer_id {
            return Err(OrderFlowError::SelfPurchase);
        }
        if let Some(stock) = listing.total_stock {
            if stock < request.quantity {
                return Err(OrderFlowError::InsufficientStock { available: stock, requested: request.quantity });
            }
        }
        if !listing.transaction_methods.contains(&request.transaction_method) {
            return Err(OrderFlowError::InvalidTransactionMethod(request.transaction_method));
        }
        if !listing.payment_methods.contains(&request.payment_method) {
            return Err(OrderFlowError::InvalidPaymentMethod(request.payment_method));
        }
        let pending = self.db.count_pending_orders_for_buyer(listing.id, buyer_id).await?;
        if pending > 0 {
            return Err(OrderFlowError::DuplicatePendingOrder(listing.id));
        }
        if let Some(requested) = request.requested_price {
            if !listing.has_price_range() {
                return Err(OrderFlowError::PriceNotNegotiable);
            }
            if requested < listing.price_min || requested > listing.price_max {
                return Err(OrderFlowError::PriceOutOfRange {
                    requested,
                    min: listing.price_min,
                    max: listing.price_max,
                });
            }
        }
        let new_order = NewOrder {
            buyer_id,
            seller_id: listing.seller_id,
            listing_id: listing.id,
            quantity: request.quantity,
            transaction_method: request.transaction_method,
            payment_method: request.payment_method,
            buyer_requested_price: request.requested_price,
        };
        let order = self.db.create_order(new_order).await?;
        debug!("🔄️📦️ Order {} placed by buyer {buyer_id} on listing {}", order.id, listing.id);
        Ok(order)
    }

    /// Changes the status of an order on behalf of `caller_id`.
    ///
    /// The caller must be the buyer or the seller of the order (`AccessDenied` otherwise). The
    /// requested edge is looked up in the transition table; an illegal edge is rejected with
    /// `InvalidTransition` and a legal edge outside the caller's role with `RoleNotPermitted`,
    /// leaving the status unchanged in both cases.
    ///
    /// Side effects per edge:
    /// * `pending → confirmed` — status write only.
    /// * `pending|confirmed → cancelled` — the reserved quantity is credited back to the listing.
    /// * `confirmed → completed` — `price_at_purchase` is locked in: the buyer's requested price
    ///   when one was recorded, the listing's `price_min` otherwise. Deferring the price lock to
    ///   completion accommodates range-priced listings whose final figure is settled at the
    ///   meetup. If tracked stock is now zero, the listing flips to `sold_out`.
    pub async fn update_order_status(
        &self,
        caller_id: i64,
        order_id: OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let party = order.party_of(caller_id).ok_or(OrderFlowError::AccessDenied)?;
        let rule = transition_rule(order.status, new_status)
            .ok_or(OrderFlowError::InvalidTransition { from: order.status, to: new_status })?;
        if !rule.role.permits(party) {
            return Err(OrderFlowError::RoleNotPermitted {
                required: rule.role.required_party(),
                from: order.status,
                to: new_status,
            });
        }
        let updated = match rule.effect {
            TransitionEffect::StatusOnly => self.db.confirm_order(&order).await?,
            TransitionEffect::RestoreStock => self.db.cancel_order(&order).await?,
            TransitionEffect::Finalize => {
                let listing = self
                    .db
                    .fetch_listing(order.listing_id)
                    .await?
                    .ok_or(OrderFlowError::ListingNotFound(order.listing_id))?;
                let final_price = order.buyer_requested_price.unwrap_or(listing.price_min);
                self.db.complete_order(&order, final_price).await?
            },
        };
        debug!("🔄️📦️ Order {order_id} moved from {} to {} by the {party}", order.status, updated.status);
        Ok(updated)
    }

    /// Fetches a single order. The caller must be the buyer or the seller.
    pub async fn order(&self, caller_id: i64, order_id: OrderId) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        order.party_of(caller_id).ok_or(OrderFlowError::AccessDenied)?;
        Ok(order)
    }

    /// Fetches the user's orders, newest first. The filter may narrow by status, by role
    /// (buyer/seller) and by time window; the result is always scoped to orders the user is a
    /// party to.
    pub async fn orders_for_user(
        &self,
        user_id: i64,
        mut filter: OrderQueryFilter,
    ) -> Result<Vec<Order>, OrderFlowError> {
        if filter.buyer_id.is_none() && filter.seller_id.is_none() {
            filter = filter.with_participant_id(user_id);
        } else if filter.buyer_id.is_some_and(|id| id != user_id) || filter.seller_id.is_some_and(|id| id != user_id) {
            return Err(OrderFlowError::AccessDenied);
        }
        trace!("🔄️📦️ Searching orders for user {user_id}: {filter}");
        let orders = self.db.search_orders(filter).await?;
        Ok(orders)
    }
}
