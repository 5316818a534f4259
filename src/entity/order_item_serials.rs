use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_item_serials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_item_id: Uuid,
    #[sea_orm(unique)]
    pub serial_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub mac_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_items::Entity",
        from = "Column::OrderItemId",
        to = "super::order_items::Column::Id"
    )]
    OrderItems,
    #[sea_orm(has_one = "super::customer_asset_mappings::Entity")]
    CustomerAssetMappings,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::customer_asset_mappings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerAssetMappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
