use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "training_courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: String,
    pub level: String,
    pub duration_hours: i32,
    pub price: i64,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::training_categories::Entity",
        from = "Column::CategoryId",
        to = "super::training_categories::Column::Id"
    )]
    TrainingCategories,
    #[sea_orm(has_many = "super::training_modules::Entity")]
    TrainingModules,
    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
}

impl Related<super::training_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingCategories.def()
    }
}

impl Related<super::training_modules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainingModules.def()
    }
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
