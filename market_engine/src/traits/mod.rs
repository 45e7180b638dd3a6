//! Behaviour that storage backends must expose in order to drive the marketplace engine.
//!
//! The traits split along the engine's collaborator surfaces:
//!
//! * [`MarketplaceDatabase`] is the top-level mutation contract: order creation with its coupled
//!   inventory reservation, and the status-transition flows with their stock side effects. All
//!   multi-step mutations are atomic within the backend.
//! * [`OrderManagement`] provides the read side for orders: fetch, filtered search, and the
//!   duplicate-pending-order probe used during placement validation.
//! * [`MeetupManagement`] owns the append-only meetup version chain: first-version creation,
//!   in-place edits, the atomic retire-and-insert reschedule pair, conditional confirmation and
//!   cancellation, and the audit history.
mod marketplace_database;
mod meetup_management;
mod order_management;

pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
pub use meetup_management::{MeetupApiError, MeetupManagement};
pub use order_management::{OrderApiError, OrderManagement};
