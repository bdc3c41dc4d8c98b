use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::*;
use tracing::info;

use common::Role;

use crate::config::BootstrapConfig;
use crate::entity::{enrollment, essay_submission, quiz_submission, user};
use crate::utils::hash;

/// Create the bootstrap admin account if configured and missing.
pub async fn seed_admin(db: &DatabaseConnection, bootstrap: &BootstrapConfig) -> Result<(), DbErr> {
    let (Some(username), Some(password)) = (&bootstrap.admin_username, &bootstrap.admin_password)
    else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash =
        hash::hash_password(password).map_err(|e| DbErr::Custom(format!("hash error: {e}")))?;

    let admin = user::ActiveModel {
        username: Set(username.trim().to_string()),
        password_hash: Set(password_hash),
        first_name: Set("System".into()),
        last_name: Set("Administrator".into()),
        date_of_birth: Set(chrono::NaiveDate::default()),
        role: Set(Role::Admin),
        has_paid: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    user::Entity::insert(admin)
        .on_conflict(
            sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!(username = %username, "Bootstrapped admin account");
    Ok(())
}

/// Unique indexes backing the one-row-per-pair rules.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes: [(&str, IndexCreateStatement); 3] = [
        (
            "idx_enrollment_student_course",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_enrollment_student_course")
                .table(enrollment::Entity)
                .col(enrollment::Column::StudentId)
                .col(enrollment::Column::CourseId)
                .to_owned(),
        ),
        (
            "idx_quiz_submission_student_quiz",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_quiz_submission_student_quiz")
                .table(quiz_submission::Entity)
                .col(quiz_submission::Column::StudentId)
                .col(quiz_submission::Column::QuizId)
                .to_owned(),
        ),
        (
            "idx_essay_submission_student_essay",
            Index::create()
                .if_not_exists()
                .unique()
                .name("idx_essay_submission_student_essay")
                .table(essay_submission::Entity)
                .col(essay_submission::Column::StudentId)
                .col(essay_submission::Column::EssayId)
                .to_owned(),
        ),
    ];

    let backend = db.get_database_backend();
    for (name, stmt) in indexes {
        db.execute(backend.build(&stmt)).await?;
        info!("Ensured index {} exists", name);
    }

    Ok(())
}
