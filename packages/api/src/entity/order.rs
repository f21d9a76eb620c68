//! `SeaORM` Entity for client orders

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "galleryId", column_type = "Text", indexed)]
    pub gallery_id: String,
    #[sea_orm(column_name = "clientEmail", column_type = "Text")]
    pub client_email: String,
    #[sea_orm(column_name = "clientName", column_type = "Text")]
    pub client_name: String,
    /// Total in cents, computed from stored image prices
    pub total: i64,
    /// ISO currency code, uppercase
    #[sea_orm(column_type = "Text")]
    pub currency: String,
    pub status: super::sea_orm_active_enums::OrderStatus,
    /// Set once the hosted payment session exists
    #[sea_orm(column_name = "stripeSessionId", column_type = "Text", nullable, unique)]
    pub stripe_session_id: Option<String>,
    #[sea_orm(column_name = "failureReason", column_type = "Text", nullable)]
    pub failure_reason: Option<String>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
    #[sea_orm(column_name = "paidAt", nullable)]
    pub paid_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gallery::Entity",
        from = "Column::GalleryId",
        to = "super::gallery::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Gallery,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::gallery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gallery.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
