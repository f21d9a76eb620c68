//! `SeaORM` Entity prelude

pub use super::gallery::Entity as Gallery;
pub use super::image::Entity as Image;
pub use super::order::Entity as Order;
pub use super::order_item::Entity as OrderItem;
pub use super::photographer::Entity as Photographer;
pub use super::stripe_event::Entity as StripeEvent;
