//! # Marketplace engine public API
//!
//! The `flow_api` module exposes the programmatic API for the order lifecycle and the meetup
//! negotiation engine. It is the surface the (out-of-scope) HTTP layer calls into.
//!
//! * [`order_flow_api`] validates purchase requests, creates orders, and drives the order status
//!   state machine with its inventory side effects.
//! * [`meetup_api`] manages the versioned meetup negotiation chain attached to in-person orders.
//! * [`transitions`] is the pure, table-driven description of the order status state machine.
//!
//! # API usage
//!
//! The pattern for both APIs is the same. An API instance is created by supplying a database
//! backend that implements [`crate::MarketplaceDatabase`]:
//!
//! ```rust,ignore
//! use market_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://market.db", 5).await?;
//! let api = OrderFlowApi::new(db);
//! let order = api.place_order(buyer_id, request).await?;
//! ```
pub mod errors;
pub mod meetup_api;
pub mod meetup_objects;
pub mod order_flow_api;
pub mod order_objects;
pub mod transitions;
