//! # shopfront-core: Pure Business Logic for the Shopfront POS
//!
//! This crate holds the cart pricing engine and the types it prices. It has
//! zero I/O dependencies: no network, no storage, no logging.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Shopfront Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Front-end                                │   │
//! │  │    Search ──► Cart ──► Checkout ──► Receipt                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ts-rs bindings                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopfront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │ Discount  │  │   Money   │  │   Cart    │  │  login    │  │   │
//! │  │   │ Tax, Rate │  │ rounded() │  │ CartLine  │  │  form     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOGGING • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CheckoutPayload                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                shopfront-client (HTTP Layer)                    │   │
//! │  │       transport, session store, reauthentication gate           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, Discount, Tax, etc.)
//! - [`money`] - Exact decimal Money and Rate arithmetic
//! - [`cart`] - Cart pricing engine and checkout payload
//! - [`error`] - Domain error types
//! - [`validation`] - Login form validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart state = same totals, every time
//! 2. **No I/O**: network and storage live in `shopfront-client`
//! 3. **Exact Money**: decimal arithmetic, rounded once at the payload boundary
//! 4. **Total Operations**: invalid cart mutations are no-ops, never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::{Cart, CatalogItem, DiscountValue, Id, Money, Rate, Tax};
//!
//! let mut cart = Cart::new();
//! let item = CatalogItem {
//!     id: Id::from(1),
//!     description: "Widget".to_string(),
//!     selling_price: Money::from_cents(1099),
//! };
//! cart.add_to_cart(&item, 1);
//! cart.apply_tax(Some(Tax {
//!     id: Id::from(1),
//!     name: "State".to_string(),
//!     rate: Rate::from_decimal("8.25".parse().unwrap()),
//! }));
//!
//! // 10.99 × 8.25% = 0.906675, rounded only in the payload
//! assert_eq!(cart.checkout_payload().tax_amount, Money::from_cents(91));
//! assert_eq!(cart.line(&item.id).unwrap().discount, DiscountValue::none());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shopfront_core::Money` instead of
// `use shopfront_core::money::Money`

pub use cart::{Cart, CartLine, CartTotals, CheckoutLine, CheckoutPayload};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
