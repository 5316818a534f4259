use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customer_asset_mappings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub serial_id: Uuid,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub subscriber_id: Option<String>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_item_serials::Entity",
        from = "Column::SerialId",
        to = "super::order_item_serials::Column::Id"
    )]
    OrderItemSerials,
}

impl Related<super::order_item_serials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItemSerials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
