use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "essay_submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub essay_id: i32,
    pub student_id: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub text_content: Option<String>,
    /// Stored upload name.
    pub uploaded_file: Option<String>,
    pub score: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub graded: bool,
    pub graded_at: Option<DateTimeUtc>,
    pub submitted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::essay::Entity",
        from = "Column::EssayId",
        to = "super::essay::Column::Id",
        on_delete = "Cascade"
    )]
    Essay,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::essay::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Essay.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
