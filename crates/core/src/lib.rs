//! `stockcart-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money and quantity value objects, and the closed error taxonomy
//! every other crate reports through.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{CartError, CartResult};
pub use id::{CartItemId, ProductId};
pub use value_object::{Money, Quantity, StockLevel};
