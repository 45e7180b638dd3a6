use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{MeetupVersion, NewMeetup, OrderId, Party};

/// Storage contract for the append-only meetup negotiation chain.
///
/// Every schedule change appends a new version; non-schedule fields may be edited in place on the
/// current version. The backend guarantees that at most one version per order has
/// `is_current = true` at any instant, and that retiring the old version and inserting its
/// replacement happen as a single atomic pair.
#[allow(async_fn_in_trait)]
pub trait MeetupManagement {
    /// Inserts the first version of a chain: `status = pending`, `is_current = true`, and the
    /// proposer's confirmation flag pre-set. Fails with [`MeetupApiError::ChainAlreadyExists`] if
    /// the order already has a chain — callers must use the update path to modify one.
    async fn create_meetup_chain(&self, meetup: NewMeetup) -> Result<MeetupVersion, MeetupApiError>;

    /// Fetches the current version for the order, or `None` if no chain exists.
    async fn fetch_current_meetup(&self, order_id: OrderId) -> Result<Option<MeetupVersion>, MeetupApiError>;

    /// Edits non-schedule fields (location, remarks) in place on the current version. Status and
    /// confirmation flags are untouched.
    async fn update_current_meetup(
        &self,
        order_id: OrderId,
        location: Option<String>,
        remarks: Option<String>,
    ) -> Result<MeetupVersion, MeetupApiError>;

    /// Atomically marks the current version `is_current = false` and inserts a brand-new version
    /// with the given schedule, `status = rescheduled`, `is_current = true`, and both confirmation
    /// flags reset. Fields not supplied are carried forward from the retired version.
    async fn reschedule_meetup(
        &self,
        order_id: OrderId,
        scheduled_at: DateTime<Utc>,
        location: Option<String>,
        remarks: Option<String>,
        proposed_by: Party,
    ) -> Result<MeetupVersion, MeetupApiError>;

    /// Sets the given party's confirmation flag on the specific version, conditional on it still
    /// being current; when both flags are then true, the status moves to `confirmed`. A version
    /// retired by a concurrent reschedule fails with [`MeetupApiError::VersionNotCurrent`].
    async fn confirm_meetup_version(&self, version_id: i64, party: Party) -> Result<MeetupVersion, MeetupApiError>;

    /// Marks the current version `cancelled` in place, recording the reason. No new version is
    /// spawned; there is nothing further to negotiate.
    async fn cancel_current_meetup(
        &self,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<MeetupVersion, MeetupApiError>;

    /// Returns every version for the order, newest first. A pure read.
    async fn meetup_history(&self, order_id: OrderId) -> Result<Vec<MeetupVersion>, MeetupApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum MeetupApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("A meetup chain already exists for order {0}")]
    ChainAlreadyExists(OrderId),
    #[error("No meetup chain exists for order {0}")]
    NoMeetupForOrder(OrderId),
    #[error("Meetup version {0} is not the current version")]
    VersionNotCurrent(i64),
}

impl From<sqlx::Error> for MeetupApiError {
    fn from(e: sqlx::Error) -> Self {
        MeetupApiError::DatabaseError(e.to_string())
    }
}
