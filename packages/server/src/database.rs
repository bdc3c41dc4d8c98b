use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

use crate::entity::*;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    create_schema(&db).await?;

    Ok(db)
}

/// Create every table that does not exist yet, parents before children.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, user::Entity).await?;
    create_table(db, course::Entity).await?;
    create_table(db, enrollment::Entity).await?;
    create_table(db, module::Entity).await?;
    create_table(db, topic::Entity).await?;
    create_table(db, lesson::Entity).await?;
    create_table(db, quiz::Entity).await?;
    create_table(db, quiz_question::Entity).await?;
    create_table(db, quiz_submission::Entity).await?;
    create_table(db, quiz_answer::Entity).await?;
    create_table(db, essay::Entity).await?;
    create_table(db, essay_submission::Entity).await?;
    create_table(db, live_class::Entity).await?;
    create_table(db, discussion::Entity).await?;
    create_table(db, reply::Entity).await?;
    create_table(db, notification::Entity).await?;
    create_table(db, library_resource::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
