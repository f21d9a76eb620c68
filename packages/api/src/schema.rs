//! Creates the tables the entities describe when they are missing.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};

use crate::entity::{gallery, image, order, order_item, photographer, stripe_event};

/// Creates every table and index in dependency order. Existing tables are
/// left alone, so this is safe to run on each start.
pub async fn sync<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create(db, photographer::Entity).await?;
    create(db, gallery::Entity).await?;
    create(db, image::Entity).await?;
    create(db, order::Entity).await?;
    create(db, order_item::Entity).await?;
    create(db, stripe_event::Entity).await?;
    tracing::info!("Database schema is in sync");
    Ok(())
}

async fn create<C: ConnectionTrait, E: EntityTrait + Copy>(db: &C, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }
    Ok(())
}
