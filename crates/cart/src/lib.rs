//! Cart domain module.
//!
//! Cart lines, the derived cart view (subtotals and total) and the stock
//! arithmetic behind reservations, implemented as deterministic domain logic
//! (no IO, no HTTP, no storage). Atomicity is the caller's job; see the infra
//! crate's reservation coordinator.

pub mod item;
pub mod reservation;
pub mod view;

pub use item::CartItem;
pub use reservation::{adjust, release, reserve};
pub use view::{CartLine, CartView, JoinedLine, LineProduct};
