//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module. Listings, orders and meetups live in the same database file, so every
//! multi-table effect (reserve-and-insert, cancel-and-restore, retire-and-append) runs inside a
//! single SQLite transaction.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use market_common::Centavos;
use sqlx::SqlitePool;

use super::db::{db_url, listings, meetups, new_pool, orders};
use crate::{
    db_types::{Listing, ListingId, MeetupVersion, NewListing, NewMeetup, NewOrder, Order, OrderId, Party},
    flow_api::order_objects::OrderQueryFilter,
    traits::{
        MarketplaceDatabase,
        MarketplaceError,
        MeetupApiError,
        MeetupManagement,
        OrderApiError,
        OrderManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_listing(&self, id: ListingId) -> Result<Option<Listing>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let listing = listings::fetch_listing(id, &mut conn).await?;
        Ok(listing)
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        listings::reserve_stock(order.listing_id, order.quantity, &mut tx).await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB", order.id);
        Ok(order)
    }

    async fn confirm_order(&self, order: &Order) -> Result<Order, MarketplaceError> {
        use crate::db_types::OrderStatusType::{Confirmed, Pending};
        let mut conn = self.pool.acquire().await?;
        let updated = orders::update_status_checked(order.id, Pending, Confirmed, &mut conn)
            .await?
            .ok_or(MarketplaceError::StaleOrderStatus(order.id, Pending))?;
        debug!("🗃️ Order {} confirmed by the seller", order.id);
        Ok(updated)
    }

    async fn cancel_order(&self, order: &Order) -> Result<Order, MarketplaceError> {
        use crate::db_types::OrderStatusType::Cancelled;
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_status_checked(order.id, order.status, Cancelled, &mut tx)
            .await?
            .ok_or(MarketplaceError::StaleOrderStatus(order.id, order.status))?;
        listings::restore_stock(order.listing_id, order.quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} cancelled; stock restored to listing {}", order.id, order.listing_id);
        Ok(updated)
    }

    async fn complete_order(&self, order: &Order, final_price: Centavos) -> Result<Order, MarketplaceError> {
        use crate::db_types::OrderStatusType::Confirmed;
        let mut tx = self.pool.begin().await?;
        let updated = orders::complete_order(order.id, final_price, &mut tx)
            .await?
            .ok_or(MarketplaceError::StaleOrderStatus(order.id, Confirmed))?;
        let sold_out = listings::mark_sold_out_if_exhausted(order.listing_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} completed at {final_price}. Listing sold out: {sold_out}", order.id);
        Ok(updated)
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn count_pending_orders_for_buyer(
        &self,
        listing_id: ListingId,
        buyer_id: i64,
    ) -> Result<i64, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_pending_for_buyer(listing_id, buyer_id, &mut conn).await?;
        Ok(count)
    }
}

impl MeetupManagement for SqliteDatabase {
    async fn create_meetup_chain(&self, meetup: NewMeetup) -> Result<MeetupVersion, MeetupApiError> {
        let mut tx = self.pool.begin().await?;
        if meetups::chain_exists(meetup.order_id, &mut tx).await? {
            return Err(MeetupApiError::ChainAlreadyExists(meetup.order_id));
        }
        let version = meetups::insert_first_version(meetup, &mut tx).await?;
        tx.commit().await?;
        Ok(version)
    }

    async fn fetch_current_meetup(&self, order_id: OrderId) -> Result<Option<MeetupVersion>, MeetupApiError> {
        let mut conn = self.pool.acquire().await?;
        let version = meetups::fetch_current(order_id, &mut conn).await?;
        Ok(version)
    }

    async fn update_current_meetup(
        &self,
        order_id: OrderId,
        location: Option<String>,
        remarks: Option<String>,
    ) -> Result<MeetupVersion, MeetupApiError> {
        let mut conn = self.pool.acquire().await?;
        let version = meetups::update_current_in_place(order_id, location, remarks, &mut conn)
            .await?
            .ok_or(MeetupApiError::NoMeetupForOrder(order_id))?;
        Ok(version)
    }

    async fn reschedule_meetup(
        &self,
        order_id: OrderId,
        scheduled_at: DateTime<Utc>,
        location: Option<String>,
        remarks: Option<String>,
        proposed_by: Party,
    ) -> Result<MeetupVersion, MeetupApiError> {
        let mut tx = self.pool.begin().await?;
        let retired =
            meetups::retire_current(order_id, &mut tx).await?.ok_or(MeetupApiError::NoMeetupForOrder(order_id))?;
        let version = meetups::insert_version(&retired, scheduled_at, location, remarks, proposed_by, &mut tx).await?;
        tx.commit().await?;
        Ok(version)
    }

    async fn confirm_meetup_version(&self, version_id: i64, party: Party) -> Result<MeetupVersion, MeetupApiError> {
        let mut tx = self.pool.begin().await?;
        let version = meetups::set_confirmation(version_id, party, &mut tx)
            .await?
            .ok_or(MeetupApiError::VersionNotCurrent(version_id))?;
        tx.commit().await?;
        Ok(version)
    }

    async fn cancel_current_meetup(
        &self,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<MeetupVersion, MeetupApiError> {
        let mut conn = self.pool.acquire().await?;
        let version = meetups::cancel_current(order_id, reason, &mut conn)
            .await?
            .ok_or(MeetupApiError::NoMeetupForOrder(order_id))?;
        Ok(version)
    }

    async fn meetup_history(&self, order_id: OrderId) -> Result<Vec<MeetupVersion>, MeetupApiError> {
        let mut conn = self.pool.acquire().await?;
        let versions = meetups::history(order_id, &mut conn).await?;
        Ok(versions)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts a listing directly. Listings are managed outside the order engine; this is the
    /// hook that test fixtures and seeding tools use.
    pub async fn insert_listing(&self, listing: NewListing) -> Result<Listing, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let listing = listings::insert_listing(listing, &mut conn).await?;
        Ok(listing)
    }
}
