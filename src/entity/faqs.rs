use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "faqs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub question: String,
    pub answer: String,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::support_categories::Entity",
        from = "Column::CategoryId",
        to = "super::support_categories::Column::Id"
    )]
    SupportCategories,
}

impl Related<super::support_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupportCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
