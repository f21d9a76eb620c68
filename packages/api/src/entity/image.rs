//! `SeaORM` Entity for uploaded gallery images

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "Image")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "galleryId", column_type = "Text", indexed)]
    pub gallery_id: String,
    /// Name as uploaded, before sanitizing
    #[sea_orm(column_type = "Text")]
    pub filename: String,
    #[sea_orm(column_name = "originalUrl", column_type = "Text")]
    pub original_url: String,
    #[sea_orm(column_name = "thumbnailUrl", column_type = "Text")]
    pub thumbnail_url: String,
    #[sea_orm(column_name = "storageKey", column_type = "Text")]
    pub storage_key: String,
    #[sea_orm(column_name = "thumbnailKey", column_type = "Text")]
    pub thumbnail_key: String,
    /// Bytes of the original
    pub size: i64,
    pub width: i32,
    pub height: i32,
    /// Price in cents
    pub price: i64,
    #[sea_orm(column_name = "uploadedAt")]
    pub uploaded_at: DateTime,
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
