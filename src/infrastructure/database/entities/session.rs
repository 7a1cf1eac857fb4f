//! Session ("transaction") entity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub transaction_id: i32,

    pub charge_point_id: String,
    pub id_tag_id: i32,
    pub connector_id: i32,

    pub meter_start: i64,
    pub meter_stop: Option<i64>,
    pub start_timestamp: DateTimeUtc,
    pub stop_timestamp: Option<DateTimeUtc>,

    pub status: String,
    pub stop_reason: Option<String>,
    pub energy_consumed: Option<f64>,
    pub cost: Option<f64>,
    pub reservation_id: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::charge_point::Entity",
        from = "Column::ChargePointId",
        to = "super::charge_point::Column::Id"
    )]
    ChargePoint,
    #[sea_orm(has_many = "super::meter_value::Entity")]
    MeterValues,
}

impl Related<super::charge_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChargePoint.def()
    }
}

impl Related<super::meter_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
