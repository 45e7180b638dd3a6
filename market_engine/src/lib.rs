//! Marketplace Engine
//!
//! The marketplace engine is the core of a campus marketplace backend: it manages the order
//! lifecycle, reserves and restores listing stock, and runs the meetup negotiation for in-person
//! handoffs. This library is transport-agnostic; an HTTP server sits in front of it and maps
//! [`OrderFlowError::error_code`] values onto status codes.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly. Instead, use the public API provided by
//!    the flow APIs. The exception is the data types used in the database. These are defined in
//!    the `db_types` module and are public.
//! 2. The engine public API ([`mod@flow_api`]). [`OrderFlowApi`] validates purchase preconditions
//!    and drives the order status machine; [`MeetupApi`] manages the versioned meetup chain.
//!    Specific backends need to implement the traits in the [`mod@traits`] module in order to act
//!    as a backend for the engine.
pub mod db_types;
mod flow_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use flow_api::{
    errors::OrderFlowError,
    meetup_api::MeetupApi,
    meetup_objects,
    order_flow_api::OrderFlowApi,
    order_objects,
    transitions,
};
