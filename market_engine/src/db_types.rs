//! Data types shared between the storage backends and the flow APIs.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use market_common::Centavos;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------      ListingId       --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ListingId(pub i64);

impl From<i64> for ListingId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

//--------------------------------------       OrderId        --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------     ListingStatus    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// The listing is visible and can be purchased.
    Active,
    /// The seller has paused the listing.
    Inactive,
    /// Tracked stock has run out. Distinct from `Inactive`: "no stock" rather than "seller paused it".
    SoldOut,
    /// The listing has been permanently retired by the seller.
    Archived,
}

impl Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Active => write!(f, "active"),
            ListingStatus::Inactive => write!(f, "inactive"),
            ListingStatus::SoldOut => write!(f, "sold_out"),
            ListingStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for ListingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "sold_out" => Ok(Self::SoldOut),
            "archived" => Ok(Self::Archived),
            s => Err(ConversionError(format!("Invalid listing status: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and stock reserved, but the seller has not acted on it yet.
    Pending,
    /// The seller has accepted the order.
    Confirmed,
    /// The transaction was consummated. Terminal.
    Completed,
    /// The order was called off by either party. Terminal.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Confirmed => write!(f, "confirmed"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//-------------------------------------- TransactionMethod    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionMethod {
    /// In-person handoff. Orders with this method carry a meetup negotiation chain.
    MeetUp,
    /// Remote fulfilment. No meetup is involved.
    Online,
}

impl Display for TransactionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionMethod::MeetUp => write!(f, "meet_up"),
            TransactionMethod::Online => write!(f, "online"),
        }
    }
}

impl FromStr for TransactionMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meet_up" => Ok(Self::MeetUp),
            "online" => Ok(Self::Online),
            s => Err(ConversionError(format!("Invalid transaction method: {s}"))),
        }
    }
}

//--------------------------------------   PaymentMethod      --------------------------------------------------------
/// How the buyer intends to pay. A descriptive tag only; no gateway integration exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Gcash,
    Maya,
    BankTransfer,
    Remittance,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Gcash => write!(f, "gcash"),
            PaymentMethod::Maya => write!(f, "maya"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::Remittance => write!(f, "remittance"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "gcash" => Ok(Self::Gcash),
            "maya" => Ok(Self::Maya),
            "bank_transfer" => Ok(Self::BankTransfer),
            "remittance" => Ok(Self::Remittance),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------      MethodSet       --------------------------------------------------------
/// The set of transaction or payment methods a listing offers, stored as comma-separated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodSet<T>(Vec<T>);

impl<T: PartialEq> MethodSet<T> {
    pub fn contains(&self, method: &T) -> bool {
        self.0.contains(method)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> From<Vec<T>> for MethodSet<T> {
    fn from(methods: Vec<T>) -> Self {
        Self(methods)
    }
}

impl<T: FromStr<Err = ConversionError>> TryFrom<String> for MethodSet<T> {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(T::from_str)
            .collect::<Result<Vec<T>, _>>()
            .map(Self)
    }
}

impl<T: Display> Display for MethodSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self.0.iter().map(|m| m.to_string()).collect::<Vec<String>>().join(",");
        write!(f, "{joined}")
    }
}

//--------------------------------------       Listing        --------------------------------------------------------
/// A seller's product record, as held by the listing store.
///
/// `total_stock == None` means stock is not tracked (unlimited). `price_min == price_max` denotes a
/// fixed price; unequal values denote a negotiable range.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller_id: i64,
    pub name: String,
    pub status: ListingStatus,
    pub total_stock: Option<i64>,
    pub sold_count: i64,
    pub price_min: Centavos,
    pub price_max: Centavos,
    #[sqlx(try_from = "String")]
    pub transaction_methods: MethodSet<TransactionMethod>,
    #[sqlx(try_from = "String")]
    pub payment_methods: MethodSet<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// True when the listing carries a genuine negotiable price range.
    pub fn has_price_range(&self) -> bool {
        self.price_min != self.price_max
    }
}

//--------------------------------------      NewListing      --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewListing {
    pub seller_id: i64,
    pub name: String,
    pub status: ListingStatus,
    pub total_stock: Option<i64>,
    pub price_min: Centavos,
    pub price_max: Centavos,
    pub transaction_methods: MethodSet<TransactionMethod>,
    pub payment_methods: MethodSet<PaymentMethod>,
}

impl NewListing {
    pub fn new(seller_id: i64, name: impl Into<String>, price: Centavos) -> Self {
        Self {
            seller_id,
            name: name.into(),
            status: ListingStatus::Active,
            total_stock: None,
            price_min: price,
            price_max: price,
            transaction_methods: vec![TransactionMethod::MeetUp, TransactionMethod::Online].into(),
            payment_methods: vec![PaymentMethod::Cash].into(),
        }
    }

    pub fn with_status(mut self, status: ListingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_stock(mut self, total_stock: i64) -> Self {
        self.total_stock = Some(total_stock);
        self
    }

    pub fn with_price_range(mut self, min: Centavos, max: Centavos) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn with_transaction_methods(mut self, methods: Vec<TransactionMethod>) -> Self {
        self.transaction_methods = methods.into();
        self
    }

    pub fn with_payment_methods(mut self, methods: Vec<PaymentMethod>) -> Self {
        self.payment_methods = methods.into();
        self
    }
}

//--------------------------------------        Order         --------------------------------------------------------
/// A buyer's commitment to purchase some quantity of a listing.
///
/// Orders are created in `pending` status, mutated only through the status state machine, and never
/// physically deleted. `price_at_purchase` is populated at completion, not at creation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub listing_id: ListingId,
    pub quantity: i64,
    pub status: OrderStatusType,
    pub transaction_method: TransactionMethod,
    pub payment_method: PaymentMethod,
    pub buyer_requested_price: Option<Centavos>,
    pub price_at_purchase: Option<Centavos>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the role the given user plays on this order, if any. Both the buyer and the seller
    /// jointly own the order in the access-control sense.
    pub fn party_of(&self, user_id: i64) -> Option<Party> {
        if self.buyer_id == user_id {
            Some(Party::Buyer)
        } else if self.seller_id == user_id {
            Some(Party::Seller)
        } else {
            None
        }
    }
}

//--------------------------------------       NewOrder       --------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub seller_id: i64,
    pub listing_id: ListingId,
    pub quantity: i64,
    pub transaction_method: TransactionMethod,
    pub payment_method: PaymentMethod,
    /// Only legal when the listing carries a genuine price range. Locked in at completion time.
    pub buyer_requested_price: Option<Centavos>,
}

//--------------------------------------        Party         --------------------------------------------------------
/// One of the two legitimate parties to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Buyer,
    Seller,
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Buyer => write!(f, "buyer"),
            Party::Seller => write!(f, "seller"),
        }
    }
}

//--------------------------------------     MeetupStatus     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MeetupStatus {
    /// Proposed, waiting for both parties to confirm.
    Pending,
    /// Both parties have confirmed the current proposal.
    Confirmed,
    /// The scheduled time was changed; prior confirmations are void.
    Rescheduled,
    /// The negotiation was called off. Terminal for the chain.
    Cancelled,
}

impl Display for MeetupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeetupStatus::Pending => write!(f, "pending"),
            MeetupStatus::Confirmed => write!(f, "confirmed"),
            MeetupStatus::Rescheduled => write!(f, "rescheduled"),
            MeetupStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------    MeetupVersion     --------------------------------------------------------
/// One version in an order's meetup negotiation chain.
///
/// The full set of versions for an order is an immutable audit trail of every proposal and
/// reschedule; at most one version per order has `is_current = true` at any instant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MeetupVersion {
    pub id: i64,
    pub order_id: OrderId,
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub status: MeetupStatus,
    pub proposed_by: Party,
    pub confirmed_by_buyer: Option<bool>,
    pub confirmed_by_seller: Option<bool>,
    pub remarks: Option<String>,
    pub cancellation_reason: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub is_current: bool,
}

impl MeetupVersion {
    pub fn is_confirmed_by(&self, party: Party) -> bool {
        match party {
            Party::Buyer => self.confirmed_by_buyer.unwrap_or(false),
            Party::Seller => self.confirmed_by_seller.unwrap_or(false),
        }
    }
}

//--------------------------------------      NewMeetup       --------------------------------------------------------
/// The first version of a meetup chain. Proposing implies confirming your own proposal, so the
/// proposer's confirmation flag is pre-set on insert.
#[derive(Debug, Clone)]
pub struct NewMeetup {
    pub order_id: OrderId,
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub remarks: Option<String>,
    pub proposed_by: Party,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn method_set_round_trips_through_text() {
        let methods: MethodSet<PaymentMethod> =
            vec![PaymentMethod::Cash, PaymentMethod::Gcash, PaymentMethod::BankTransfer].into();
        let text = methods.to_string();
        assert_eq!(text, "cash,gcash,bank_transfer");
        let parsed = MethodSet::<PaymentMethod>::try_from(text).unwrap();
        assert_eq!(parsed, methods);
    }

    #[test]
    fn wire_names_are_snake_case_json() {
        assert_eq!(serde_json::to_string(&OrderStatusType::Confirmed).unwrap(), r#""confirmed""#);
        assert_eq!(serde_json::to_string(&ListingStatus::SoldOut).unwrap(), r#""sold_out""#);
        let methods: MethodSet<TransactionMethod> = vec![TransactionMethod::MeetUp].into();
        assert_eq!(serde_json::to_string(&methods).unwrap(), r#"["meet_up"]"#);
        let parsed: MethodSet<PaymentMethod> = serde_json::from_str(r#"["gcash","bank_transfer"]"#).unwrap();
        assert!(parsed.contains(&PaymentMethod::BankTransfer));
    }

    #[test]
    fn method_set_rejects_unknown_entries() {
        let result = MethodSet::<TransactionMethod>::try_from("meet_up,carrier_pigeon".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn order_party_resolution() {
        let order = Order {
            id: OrderId(1),
            buyer_id: 10,
            seller_id: 20,
            listing_id: ListingId(1),
            quantity: 1,
            status: OrderStatusType::Pending,
            transaction_method: TransactionMethod::MeetUp,
            payment_method: PaymentMethod::Cash,
            buyer_requested_price: None,
            price_at_purchase: None,
            placed_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.party_of(10), Some(Party::Buyer));
        assert_eq!(order.party_of(20), Some(Party::Seller));
        assert_eq!(order.party_of(30), None);
    }
}
