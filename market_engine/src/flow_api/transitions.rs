//! The order status state machine, expressed as a transition table.
//!
//! Each legal edge carries the role allowed to drive it and the side effect the flow must run.
//! Keeping the table as data makes the machine auditable and testable in isolation from
//! persistence:
//!
//! | From      | To        | Allowed caller   | Side effect                            |
//! |-----------|-----------|------------------|----------------------------------------|
//! | pending   | confirmed | seller only      | none beyond the status write           |
//! | pending   | cancelled | buyer or seller  | stock restored                         |
//! | confirmed | completed | seller only      | final price set, sold-out flip         |
//! | confirmed | cancelled | buyer or seller  | stock restored                         |
//!
//! Everything else is rejected: `completed` and `cancelled` are terminal, and no transition ever
//! re-enters `pending`.

use crate::db_types::{OrderStatusType, Party};

/// Who may drive a given edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRule {
    SellerOnly,
    BuyerOrSeller,
}

impl RoleRule {
    pub fn permits(&self, party: Party) -> bool {
        match self {
            RoleRule::SellerOnly => party == Party::Seller,
            RoleRule::BuyerOrSeller => true,
        }
    }

    /// The role named in error messages when the rule rejects a caller.
    pub fn required_party(&self) -> Party {
        match self {
            RoleRule::SellerOnly => Party::Seller,
            RoleRule::BuyerOrSeller => Party::Buyer,
        }
    }
}

/// The side effect the order flow runs alongside the status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Status write only.
    StatusOnly,
    /// Credit the reserved quantity back to the listing.
    RestoreStock,
    /// Lock `price_at_purchase` and flip the listing to `sold_out` if stock is exhausted.
    Finalize,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeRule {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub role: RoleRule,
    pub effect: TransitionEffect,
}

use OrderStatusType::{Cancelled, Completed, Confirmed, Pending};

const TRANSITIONS: [EdgeRule; 4] = [
    EdgeRule { from: Pending, to: Confirmed, role: RoleRule::SellerOnly, effect: TransitionEffect::StatusOnly },
    EdgeRule { from: Pending, to: Cancelled, role: RoleRule::BuyerOrSeller, effect: TransitionEffect::RestoreStock },
    EdgeRule { from: Confirmed, to: Completed, role: RoleRule::SellerOnly, effect: TransitionEffect::Finalize },
    EdgeRule { from: Confirmed, to: Cancelled, role: RoleRule::BuyerOrSeller, effect: TransitionEffect::RestoreStock },
];

/// Looks up the rule for the requested edge, or `None` if the transition is illegal.
pub fn transition_rule(from: OrderStatusType, to: OrderStatusType) -> Option<&'static EdgeRule> {
    TRANSITIONS.iter().find(|edge| edge.from == from && edge.to == to)
}
