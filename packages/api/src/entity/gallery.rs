//! `SeaORM` Entity for client galleries

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Gallery")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "photographerId", column_type = "Text", indexed)]
    pub photographer_id: String,
    #[sea_orm(column_name = "clientName", column_type = "Text")]
    pub client_name: String,
    #[sea_orm(column_name = "clientEmail", column_type = "Text")]
    pub client_email: String,
    /// Unguessable code handed to the client; the only way in for them
    #[sea_orm(column_name = "accessCode", column_type = "Text", unique)]
    pub access_code: String,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    /// Inclusive: the gallery is still open at exactly this instant
    #[sea_orm(column_name = "expiresAt", nullable)]
    pub expires_at: Option<DateTime>,
    pub views: i64,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::photographer::Entity",
        from = "Column::PhotographerId",
        to = "super::photographer::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Photographer,
    #[sea_orm(has_many = "super::image::Entity")]
    Image,
    #[sea_orm(has_many = "super::order::Entity")]
    Order,
}

impl Related<super::photographer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photographer.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
