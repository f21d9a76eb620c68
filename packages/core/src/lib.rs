//! Domain rules for client galleries: money, the client's cart, the
//! photographer's price sheet, access windows and authoritative order pricing.
//!
//! Nothing in here touches the network or the database; the API crate feeds
//! these types from its store and turns their errors into responses.

pub mod access;
pub mod cart;
pub mod money;
pub mod order;
pub mod pricing;

pub use access::{AccessDenied, check_access};
pub use cart::{Cart, CartEntry, LineItem};
pub use money::{Money, MoneyError};
pub use order::{PricedLine, PricedOrder, PricingError, price_order};
pub use pricing::PriceSheet;
