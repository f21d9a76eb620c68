//! `SeaORM` Entity for processed Stripe webhook events

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tracks processed Stripe webhook events for idempotency
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "StripeEvent")]
pub struct Model {
    /// Stripe event ID (evt_xxx)
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "eventType", column_type = "Text")]
    pub event_type: String,
    #[sea_orm(column_name = "processedAt")]
    pub processed_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
