//! # Domain Types
//!
//! Reference entities the POS screen works with.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │    Discount     │   │      Tax        │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id, name       │   │  id, name       │       │
//! │  │  description    │   │  DiscountValue  │   │  rate (Rate)    │       │
//! │  │  selling_price  │   │                 │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ DiscountValue   │   │    Customer     │   │   SaleStatus    │       │
//! │  │  ─────────────  │   │    Location     │   │  ─────────────  │       │
//! │  │  Fixed(Money)   │   │  ─────────────  │   │  Pending        │       │
//! │  │  Percentage(%)  │   │  id, name       │   │  Completed      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identifiers
//! The backend is inconsistent about identifier types (integers for most
//! tables, strings for some). [`Id`] accepts both and normalises to a string.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Identifier
// =============================================================================

/// Entity identifier as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, TS)]
#[ts(export)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Id(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id(value)
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Id(text),
            RawId::Signed(n) => Id(n.to_string()),
            RawId::Unsigned(n) => Id(n.to_string()),
        })
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage held as an exact decimal (`10` = 10 %).
///
/// Used for tax rates and percentage discounts. Rates such as 8.875 % are
/// representable without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Rate(#[ts(type = "number")] Decimal);

impl Rate {
    /// Creates a rate from a whole percentage.
    #[inline]
    pub fn from_percent(percent: i64) -> Self {
        Rate(Decimal::from(percent))
    }

    /// Creates a rate from an exact decimal percentage.
    #[inline]
    pub const fn from_decimal(percent: Decimal) -> Self {
        Rate(percent)
    }

    /// Returns the percentage value.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True for rates inside `[0, 100]`.
    pub fn is_valid_percentage(&self) -> bool {
        self.0 >= Decimal::ZERO && self.0 <= Decimal::ONE_HUNDRED
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Rate)
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Absolute currency amount.
    Fixed,
    /// Percentage of the amount it applies to.
    Percentage,
}

/// A discount carrying its own payload.
///
/// Wire form: `{ "type": "percentage", "value": 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountValue {
    Fixed(Money),
    Percentage(Rate),
}

impl DiscountValue {
    /// The zero discount every new cart line starts with.
    pub fn none() -> Self {
        DiscountValue::Fixed(Money::zero())
    }

    pub fn kind(&self) -> DiscountKind {
        match self {
            DiscountValue::Fixed(_) => DiscountKind::Fixed,
            DiscountValue::Percentage(_) => DiscountKind::Percentage,
        }
    }

    /// The raw number the user entered (amount or percentage).
    pub fn raw_value(&self) -> Decimal {
        match self {
            DiscountValue::Fixed(amount) => amount.amount(),
            DiscountValue::Percentage(rate) => rate.value(),
        }
    }

    /// Discount amount against `base`, before any clamping.
    pub fn amount_on(&self, base: Money) -> Money {
        match self {
            DiscountValue::Fixed(amount) => *amount,
            DiscountValue::Percentage(rate) => base.percent(*rate),
        }
    }

    /// Non-negative amounts and percentages within `[0, 100]`.
    pub fn is_valid(&self) -> bool {
        match self {
            DiscountValue::Fixed(amount) => !amount.is_negative(),
            DiscountValue::Percentage(rate) => rate.is_valid_percentage(),
        }
    }
}

impl Default for DiscountValue {
    fn default() -> Self {
        DiscountValue::none()
    }
}

/// A cart-level discount defined in the configuration screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub value: DiscountValue,
}

// =============================================================================
// Tax
// =============================================================================

/// A tax applied to the whole cart after all discounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    pub rate: Rate,
}

// =============================================================================
// Catalog, Customers, Locations
// =============================================================================

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Id,
    #[serde(default)]
    pub description: String,
    pub selling_price: Money,
}

/// Stock record returned by the POS item search: an item at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Id,
    pub item: CatalogItem,
    #[serde(default)]
    pub location_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Id,
    #[serde(default)]
    pub name: String,
}

/// A selling location (store, warehouse counter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Id,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status a sale is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Saved but not yet paid.
    #[default]
    Pending,
    /// Paid and finalized.
    Completed,
}

// =============================================================================
// Unit Tests
// =============================================================================
