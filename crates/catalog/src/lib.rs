//! Product catalog domain module.
//!
//! Catalog records and their validation rules. The cart only ever reads a
//! product's price and moves units in and out of its stock level; everything
//! else here (sku, description, category) belongs to catalog management.

pub mod product;

pub use product::{NewProduct, Product};
