use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "training_modules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub video_url: String,
    pub duration_minutes: i32,
    pub position: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::training_courses::Entity",
        from = "Column::CourseId",
        to = "super::training_courses::Column::Id"
    )]
    TrainingCourses,
}

impl Related<super::training_courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingCourses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
