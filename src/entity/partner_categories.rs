use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "partner_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::partners::Entity")]
    Partners,
    #[sea_orm(has_many = "super::partner_category_asset_limits::Entity")]
    PartnerCategoryAssetLimits,
}

impl Related<super::partners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partners.def()
    }
}

impl Related<super::partner_category_asset_limits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartnerCategoryAssetLimits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
