//! `SeaORM` Entity definitions

pub mod prelude;

pub mod gallery;
pub mod image;
pub mod order;
pub mod order_item;
pub mod photographer;
pub mod sea_orm_active_enums;
pub mod stripe_event;
