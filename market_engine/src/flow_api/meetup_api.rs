use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{MeetupStatus, MeetupVersion, NewMeetup, Order, OrderId, Party, TransactionMethod},
    flow_api::{
        errors::OrderFlowError,
        meetup_objects::{MeetupUpdateRequest, NewMeetupRequest},
    },
    traits::MarketplaceDatabase,
};

/// `MeetupApi` manages the versioned meetup negotiation chain attached to in-person orders:
/// proposal, reschedule, dual confirmation and cancellation, plus the audit history.
///
/// Every operation checks that the caller is a legitimate party to the order before touching the
/// chain. A meetup chain is owned by its order and has no independent lifecycle.
pub struct MeetupApi<B> {
    db: B,
}

impl<B> Debug for MeetupApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MeetupApi")
    }
}

impl<B> MeetupApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> MeetupApi<B>
where B: MarketplaceDatabase
{
    /// Opens the negotiation chain for an order with the caller's first proposal.
    ///
    /// The order must use the meet-up transaction method, and must not already have a chain —
    /// callers modify an existing chain through [`Self::update_meetup`], never by re-creating it.
    /// The first version is stored with `pending` status and the proposer's confirmation flag
    /// pre-set: proposing implies confirming your own proposal.
    pub async fn create_meetup(
        &self,
        caller_id: i64,
        order_id: OrderId,
        request: NewMeetupRequest,
    ) -> Result<MeetupVersion, OrderFlowError> {
        let (order, party) = self.order_for_party(caller_id, order_id).await?;
        if order.transaction_method != TransactionMethod::MeetUp {
            return Err(OrderFlowError::MeetupNotRequired(order_id));
        }
        let meetup = NewMeetup {
            order_id,
            location: request.location,
            scheduled_at: request.scheduled_at,
            remarks: request.remarks,
            proposed_by: party,
        };
        let version = self.db.create_meetup_chain(meetup).await?;
        debug!("🤝️ Meetup chain opened for order {order_id} by the {party}");
        Ok(version)
    }

    /// Updates the current proposal. Dual-purpose based on which fields are present:
    ///
    /// * With `scheduled_at` — a reschedule. The current version is retired and a new one appended
    ///   with `rescheduled` status; both confirmation flags are reset, because a new time voids any
    ///   prior agreement. Unspecified fields carry forward.
    /// * Without — an in-place edit of location/remarks on the current version; status and
    ///   confirmation flags are untouched.
    pub async fn update_meetup(
        &self,
        caller_id: i64,
        order_id: OrderId,
        update: MeetupUpdateRequest,
    ) -> Result<MeetupVersion, OrderFlowError> {
        let (_, party) = self.order_for_party(caller_id, order_id).await?;
        if update.is_empty() {
            return Err(OrderFlowError::EmptyUpdate);
        }
        let current = self.current_version(order_id).await?;
        if current.status == MeetupStatus::Cancelled {
            return Err(OrderFlowError::MeetupCancelled(order_id));
        }
        let version = match update.scheduled_at {
            Some(scheduled_at) => {
                let version = self
                    .db
                    .reschedule_meetup(order_id, scheduled_at, update.location, update.remarks, party)
                    .await?;
                debug!("🤝️ Meetup for order {order_id} rescheduled by the {party}; confirmations reset");
                version
            },
            None => self.db.update_current_meetup(order_id, update.location, update.remarks).await?,
        };
        Ok(version)
    }

    /// Records the caller's confirmation on the current version. When both parties have confirmed,
    /// the version moves to `confirmed` status.
    ///
    /// The confirmation is applied to the specific version the caller saw; if a concurrent
    /// reschedule retired it in the meantime, the call fails with a conflict rather than silently
    /// confirming the replacement proposal.
    pub async fn confirm_meetup(&self, caller_id: i64, order_id: OrderId) -> Result<MeetupVersion, OrderFlowError> {
        let (_, party) = self.order_for_party(caller_id, order_id).await?;
        let current = self.current_version(order_id).await?;
        if current.status == MeetupStatus::Cancelled {
            return Err(OrderFlowError::MeetupCancelled(order_id));
        }
        let version = self.db.confirm_meetup_version(current.id, party).await?;
        if version.status == MeetupStatus::Confirmed {
            debug!("🤝️ Meetup for order {order_id} is confirmed by both parties");
        }
        Ok(version)
    }

    /// Cancels the negotiation, marking the current version `cancelled` in place. No new version
    /// is spawned; there is nothing further to negotiate.
    pub async fn cancel_meetup(
        &self,
        caller_id: i64,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<MeetupVersion, OrderFlowError> {
        let (_, party) = self.order_for_party(caller_id, order_id).await?;
        let current = self.current_version(order_id).await?;
        if current.status == MeetupStatus::Cancelled {
            return Err(OrderFlowError::MeetupCancelled(order_id));
        }
        let version = self.db.cancel_current_meetup(order_id, reason).await?;
        debug!("🤝️ Meetup for order {order_id} cancelled by the {party}");
        Ok(version)
    }

    /// Returns the current version of the order's meetup chain.
    pub async fn current_meetup(&self, caller_id: i64, order_id: OrderId) -> Result<MeetupVersion, OrderFlowError> {
        self.order_for_party(caller_id, order_id).await?;
        self.current_version(order_id).await
    }

    /// Returns every version for the order, newest first, for audit or UI display. A pure read.
    pub async fn meetup_history(
        &self,
        caller_id: i64,
        order_id: OrderId,
    ) -> Result<Vec<MeetupVersion>, OrderFlowError> {
        self.order_for_party(caller_id, order_id).await?;
        let history = self.db.meetup_history(order_id).await?;
        Ok(history)
    }

    async fn order_for_party(&self, caller_id: i64, order_id: OrderId) -> Result<(Order, Party), OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let party = order.party_of(caller_id).ok_or(OrderFlowError::AccessDenied)?;
        Ok((order, party))
    }

    async fn current_version(&self, order_id: OrderId) -> Result<MeetupVersion, OrderFlowError> {
        self.db
            .fetch_current_meetup(order_id)
            .await?
            .ok_or(OrderFlowError::MeetupNotFound(order_id))
    }
}
