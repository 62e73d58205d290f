//! # Cart Pricing Engine
//!
//! Holds the lines of an in-progress sale plus the cart-level selections
//! (customer, location, discount, tax, notes) and derives every total from
//! them on demand.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Pricing (order matters)                         │
//! │                                                                         │
//! │  per line:  subtotal = unit_price × quantity                            │
//! │             discount = fixed amount | subtotal × % / 100  (≤ subtotal)  │
//! │             total    = subtotal − discount                              │
//! │                                                                         │
//! │  cart:      subtotal             = Σ line subtotals                     │
//! │             items_discount_total = Σ line discounts                     │
//! │             base                 = subtotal − items_discount_total      │
//! │             cart_discount        = fixed | base × % / 100   (≤ base)    │
//! │             total_after_discount = base − cart_discount                 │
//! │             tax                  = total_after_discount × rate / 100    │
//! │             grand_total          = total_after_discount + tax           │
//! │                                                                         │
//! │  Nothing is cached: every getter recomputes from the lines.             │
//! │  Nothing is rounded until checkout_payload().                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invalid Mutations
//! Mutations return `true` when the cart changed. Invalid arguments
//! (non-positive quantity on add, unknown item, negative discount) leave the
//! cart untouched and return `false`; they are never errors.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    CatalogItem, Customer, Discount, DiscountKind, DiscountValue, Id, Location, Tax,
};

// =============================================================================
// Cart Line
// =============================================================================

/// One product line in the cart.
///
/// ## Design Notes
/// - `item_id` is the line identity; a cart never holds two lines for it
/// - `unit_price` is frozen when the item is first added; adding the same
///   item again only changes the quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: Id,

    /// Description at time of adding (frozen)
    pub description: String,

    /// Price at time of adding (frozen)
    pub unit_price: Money,

    /// Always ≥ 1
    pub quantity: i64,

    pub discount: DiscountValue,
}

impl CartLine {
    /// Creates a new line from a catalog item with no discount.
    pub fn from_item(item: &CatalogItem, quantity: i64) -> Self {
        CartLine {
            item_id: item.id.clone(),
            description: item.description.clone(),
            unit_price: item.selling_price,
            quantity,
            discount: DiscountValue::none(),
        }
    }

    /// `unit_price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Discount amount for this line, bounded by the line subtotal.
    pub fn discount_amount(&self) -> Money {
        let subtotal = self.subtotal();
        self.discount.amount_on(subtotal).clamp_to(subtotal)
    }

    /// Line subtotal after its own discount.
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount_amount()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The POS cart.
///
/// ## Invariants
/// - Lines are unique by `item_id` (adding the same item increases quantity)
/// - No line has quantity ≤ 0 (setting it there removes the line)
/// - Derived totals are never stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    customer: Option<Customer>,
    location: Option<Location>,
    applied_discount: Option<Discount>,
    applied_tax: Option<Tax>,
    notes: String,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    // -------------------------------------------------------------------------
    // Line mutations
    // -------------------------------------------------------------------------

    /// Adds an item or increases the quantity of its existing line.
    ///
    /// Returns `false` (and does nothing) when `quantity` is not positive or
    /// the merged quantity would not fit in an `i64`.
    pub fn add_to_cart(&mut self, item: &CatalogItem, quantity: i64) -> bool {
        if quantity <= 0 {
            return false;
        }

        if let Some(line) = self.line_mut(&item.id) {
            return match line.quantity.checked_add(quantity) {
                Some(merged) => {
                    line.quantity = merged;
                    true
                }
                None => false,
            };
        }

        self.lines.push(CartLine::from_item(item, quantity));
        true
    }

    /// Adds a single unit of an item.
    pub fn add_one(&mut self, item: &CatalogItem) -> bool {
        self.add_to_cart(item, 1)
    }

    /// Removes the line for `item_id`. Returns `false` if it was not in the cart.
    pub fn remove_from_cart(&mut self, item_id: &Id) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|line| &line.item_id != item_id);
        self.lines.len() != initial_len
    }

    /// Sets the quantity of a line; a quantity ≤ 0 removes it.
    pub fn update_quantity(&mut self, item_id: &Id, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_from_cart(item_id);
        }

        match self.line_mut(item_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Sets the discount of a line.
    ///
    /// Negative amounts and percentages outside `[0, 100]` are rejected.
    pub fn update_item_discount(&mut self, item_id: &Id, discount: DiscountValue) -> bool {
        if !discount.is_valid() {
            return false;
        }

        match self.line_mut(item_id) {
            Some(line) => {
                line.discount = discount;
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Cart-level selections
    // -------------------------------------------------------------------------

    /// Sets (or with `None`, clears) the cart-level discount.
    pub fn apply_discount(&mut self, discount: Option<Discount>) {
        self.applied_discount = discount;
    }

    pub fn remove_discount(&mut self) {
        self.applied_discount = None;
    }

    /// Sets (or with `None`, clears) the cart-level tax.
    pub fn apply_tax(&mut self, tax: Option<Tax>) {
        self.applied_tax = tax;
    }

    pub fn remove_tax(&mut self) {
        self.applied_tax = None;
    }

    pub fn set_customer(&mut self, customer: Option<Customer>) {
        self.customer = customer;
    }

    pub fn remove_customer(&mut self) {
        self.customer = None;
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Resets lines, customer, discount, tax and notes.
    ///
    /// The selling location is kept: it belongs to the POS session, not to
    /// the sale.
    pub fn clear_cart(&mut self) {
        self.lines.clear();
        self.customer = None;
        self.applied_discount = None;
        self.applied_tax = None;
        self.notes.clear();
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &Id) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.item_id == item_id)
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn applied_discount(&self) -> Option<&Discount> {
        self.applied_discount.as_ref()
    }

    pub fn applied_tax(&self) -> Option<&Tax> {
        self.applied_tax.as_ref()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_mut(&mut self, item_id: &Id) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.item_id == item_id)
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    /// Sum of line subtotals, before any discount.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Sum of per-line discount amounts.
    pub fn items_discount_total(&self) -> Money {
        self.lines.iter().map(CartLine::discount_amount).sum()
    }

    /// Cart-level discount, computed against the already line-discounted total.
    pub fn cart_discount_amount(&self) -> Money {
        match &self.applied_discount {
            None => Money::zero(),
            Some(discount) => {
                let base = self.subtotal() - self.items_discount_total();
                discount.value.amount_on(base).clamp_to(base)
            }
        }
    }

    pub fn total_after_discount(&self) -> Money {
        self.subtotal() - self.items_discount_total() - self.cart_discount_amount()
    }

    pub fn tax_amount(&self) -> Money {
        match &self.applied_tax {
            None => Money::zero(),
            Some(tax) => self.total_after_discount().percent(tax.rate),
        }
    }

    pub fn grand_total(&self) -> Money {
        self.total_after_discount() + self.tax_amount()
    }

    /// Sum of all line quantities.
    pub fn total_items(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |total, line| total.saturating_add(line.quantity))
    }

    /// Snapshot of every derived value.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    /// Builds the checkout payload sent to the sales API.
    ///
    /// Pure: calling it repeatedly without a mutation yields equal payloads.
    /// Money fields are rounded to currency precision here and only here.
    pub fn checkout_payload(&self) -> CheckoutPayload {
        CheckoutPayload {
            customer_id: self.customer.as_ref().map(|c| c.id.clone()),
            items: self
                .lines
                .iter()
                .map(|line| CheckoutLine {
                    item_id: line.item_id.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price.rounded(),
                    total_price: line.subtotal().rounded(),
                    discount: line.discount.raw_value(),
                    discount_type: line.discount.kind(),
                })
                .collect(),
            discount_id: self.applied_discount.as_ref().map(|d| d.id.clone()),
            tax_id: self.applied_tax.as_ref().map(|t| t.id.clone()),
            subtotal: self.subtotal().rounded(),
            discount_amount: (self.items_discount_total() + self.cart_discount_amount()).rounded(),
            tax_amount: self.tax_amount().rounded(),
            total: self.grand_total().rounded(),
            notes: self.notes.clone(),
        }
    }
}

// =============================================================================
// Totals and Checkout Payload
// =============================================================================

/// Cart totals summary (unrounded) for display layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    #[ts(type = "number")]
    pub line_count: usize,
    #[ts(type = "number")]
    pub total_items: i64,
    pub subtotal: Money,
    pub items_discount_total: Money,
    pub cart_discount_amount: Money,
    pub total_after_discount: Money,
    pub tax_amount: Money,
    pub grand_total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_items: cart.total_items(),
            subtotal: cart.subtotal(),
            items_discount_total: cart.items_discount_total(),
            cart_discount_amount: cart.cart_discount_amount(),
            total_after_discount: cart.total_after_discount(),
            tax_amount: cart.tax_amount(),
            grand_total: cart.grand_total(),
        }
    }
}

/// One line of the checkout payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub item_id: Id,
    #[ts(type = "number")]
    pub quantity: i64,
    pub unit_price: Money,
    /// Line subtotal before the line discount.
    pub total_price: Money,
    /// Amount or percentage, as entered; see `discount_type`.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub discount: Decimal,
    pub discount_type: DiscountKind,
}

/// Body of a sale or held-sale request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutPayload {
    pub customer_id: Option<Id>,
    pub items: Vec<CheckoutLine>,
    pub discount_id: Option<Id>,
    pub tax_id: Option<Id>,
    pub subtotal: Money,
    /// Line discounts plus the cart-level discount.
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
    pub notes: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
