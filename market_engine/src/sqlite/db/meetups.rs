use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{MeetupVersion, NewMeetup, OrderId, Party},
    traits::MeetupApiError,
};

pub async fn chain_exists(order_id: OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meetups WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Inserts the first version of a chain. The proposer's confirmation flag is pre-set; proposing a
/// time implies agreeing with it.
pub async fn insert_first_version(
    meetup: NewMeetup,
    conn: &mut SqliteConnection,
) -> Result<MeetupVersion, MeetupApiError> {
    let confirmed_by_buyer = meetup.proposed_by == Party::Buyer;
    let confirmed_by_seller = meetup.proposed_by == Party::Seller;
    let version: MeetupVersion = sqlx::query_as(
        r#"
            INSERT INTO meetups (
                order_id,
                location,
                scheduled_at,
                status,
                proposed_by,
                confirmed_by_buyer,
                confirmed_by_seller,
                remarks,
                is_current
            ) VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, 1)
            RETURNING *;
        "#,
    )
    .bind(meetup.order_id)
    .bind(meetup.location)
    .bind(meetup.scheduled_at)
    .bind(meetup.proposed_by)
    .bind(confirmed_by_buyer)
    .bind(confirmed_by_seller)
    .bind(meetup.remarks)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Meetup chain opened for order {} with version {}", version.order_id, version.id);
    Ok(version)
}

pub async fn fetch_current(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<MeetupVersion>, sqlx::Error> {
    let version = sqlx::query_as("SELECT * FROM meetups WHERE order_id = $1 AND is_current = 1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(version)
}

/// Edits location/remarks on the current version without touching status, confirmation flags or
/// the schedule. Returns `None` when the order has no chain.
pub async fn update_current_in_place(
    order_id: OrderId,
    location: Option<String>,
    remarks: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<MeetupVersion>, sqlx::Error> {
    let version = sqlx::query_as(
        r#"
            UPDATE meetups SET
                location = COALESCE($1, location),
                remarks = COALESCE($2, remarks),
                changed_at = CURRENT_TIMESTAMP
            WHERE order_id = $3 AND is_current = 1
            RETURNING *;
        "#,
    )
    .bind(location)
    .bind(remarks)
    .bind(order_id)
    // fetch_all drains the statement so the autocommit has landed before this returns; the
    // partial unique index on (order_id) WHERE is_current guarantees at most one row.
    .fetch_all(conn)
    .await?
    .pop();
    Ok(version)
}

/// Clears the `is_current` flag on the current version, returning the retired row so its fields
/// can be carried forward into the replacement. Must run inside the same transaction as
/// [`insert_version`]; the partial unique index on `(order_id) WHERE is_current` would otherwise
/// reject the insert.
pub async fn retire_current(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<MeetupVersion>, sqlx::Error> {
    let version = sqlx::query_as(
        r#"
            UPDATE meetups SET is_current = 0
            WHERE order_id = $1 AND is_current = 1
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(version)
}

/// Appends the replacement version after a reschedule: `rescheduled` status, both confirmation
/// flags cleared, fields not supplied carried forward from the retired version.
pub async fn insert_version(
    retired: &MeetupVersion,
    scheduled_at: DateTime<Utc>,
    location: Option<String>,
    remarks: Option<String>,
    proposed_by: Party,
    conn: &mut SqliteConnection,
) -> Result<MeetupVersion, MeetupApiError> {
    let location = location.or_else(|| retired.location.clone());
    let remarks = remarks.or_else(|| retired.remarks.clone());
    let version: MeetupVersion = sqlx::query_as(
        r#"
            INSERT INTO meetups (
                order_id,
                location,
                scheduled_at,
                status,
                proposed_by,
                confirmed_by_buyer,
                confirmed_by_seller,
                remarks,
                is_current
            ) VALUES ($1, $2, $3, 'rescheduled', $4, 0, 0, $5, 1)
            RETURNING *;
        "#,
    )
    .bind(retired.order_id)
    .bind(location)
    .bind(scheduled_at)
    .bind(proposed_by)
    .bind(remarks)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Meetup for order {} rescheduled as version {}", version.order_id, version.id);
    Ok(version)
}

/// Sets the party's confirmation flag on the specific version, conditional on it still being
/// current. When both flags are then set, the status moves to `confirmed` in a follow-up write.
/// Returns `None` when the version has been retired by a concurrent reschedule.
///
/// Both writes must run inside one transaction, or a reschedule committing between them could
/// retire the version and still see the status promotion land on the retired row.
pub async fn set_confirmation(
    version_id: i64,
    party: Party,
    conn: &mut SqliteConnection,
) -> Result<Option<MeetupVersion>, sqlx::Error> {
    let sql = match party {
        Party::Buyer => {
            r#"
            UPDATE meetups SET confirmed_by_buyer = 1, changed_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND is_current = 1
            RETURNING *;
        "#
        },
        Party::Seller => {
            r#"
            UPDATE meetups SET confirmed_by_seller = 1, changed_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND is_current = 1
            RETURNING *;
        "#
        },
    };
    let version: Option<MeetupVersion> = sqlx::query_as(sql).bind(version_id).fetch_optional(&mut *conn).await?;
    let Some(version) = version else {
        return Ok(None);
    };
    if version.is_confirmed_by(Party::Buyer) && version.is_confirmed_by(Party::Seller) {
        let confirmed = sqlx::query_as(
            r#"
            UPDATE meetups SET status = 'confirmed'
            WHERE id = $1 AND is_current = 1 AND status IN ('pending', 'rescheduled')
            RETURNING *;
        "#,
        )
        .bind(version_id)
        .fetch_optional(conn)
        .await?;
        return Ok(confirmed.or(Some(version)));
    }
    Ok(Some(version))
}

/// Marks the current version `cancelled` in place with the given reason. Returns `None` when the
/// order has no chain.
pub async fn cancel_current(
    order_id: OrderId,
    reason: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<MeetupVersion>, sqlx::Error> {
    let version = sqlx::query_as(
        r#"
            UPDATE meetups SET
                status = 'cancelled',
                cancellation_reason = $1,
                changed_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND is_current = 1
            RETURNING *;
        "#,
    )
    .bind(reason)
    .bind(order_id)
    // fetch_all drains the statement so the autocommit has landed before this returns; the
    // partial unique index on (order_id) WHERE is_current guarantees at most one row.
    .fetch_all(conn)
    .await?
    .pop();
    Ok(version)
}

/// Every version for the order, newest first.
pub async fn history(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<MeetupVersion>, sqlx::Error> {
    let versions = sqlx::query_as("SELECT * FROM meetups WHERE order_id = $1 ORDER BY id DESC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(versions)
}
