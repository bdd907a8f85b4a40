use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: String,
    pub progress_percentage: f64,
    pub enrolled_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::training_courses::Entity",
        from = "Column::CourseId",
        to = "super::training_courses::Column::Id"
    )]
    TrainingCourses,
    #[sea_orm(has_many = "super::module_progress::Entity")]
    ModuleProgress,
}

impl Related<super::training_courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingCourses.def()
    }
}

impl Related<super::module_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModuleProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
