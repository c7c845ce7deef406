use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "auth_id": 1 }),
        ],
    )
    .await?;

    // Projects
    create_indexes(
        db,
        "projects",
        vec![index(bson::doc! { "admin_id": 1 })],
    )
    .await?;

    // Expenses / phases / materials are always queried per project
    create_indexes(db, "expenses", vec![index(bson::doc! { "project_id": 1 })]).await?;
    create_indexes(db, "phases", vec![index(bson::doc! { "project_id": 1 })]).await?;
    create_indexes(db, "materials", vec![index(bson::doc! { "project_id": 1 })]).await?;

    // Notifications: the live feed reads the most recent window for one
    // recipient, and mark-all-as-read filters on the unread flag.
    create_indexes(
        db,
        "notifications",
        vec![
            index(bson::doc! { "recipient_id": 1, "created_at": -1 }),
            index(bson::doc! { "recipient_id": 1, "is_read": 1 }),
        ],
    )
    .await?;

    info!("MongoDB indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    Ok(())
}
