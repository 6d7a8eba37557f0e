use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One bag on a packing report. Quality fields hold the effective quality of the
/// bag (the report header's unless overridden when the item was written).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = ReportItem)]
#[sea_orm(table_name = "report_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub report_id: i32,
    pub bag_no: i32,
    pub quality_name: String,
    pub denier: i32,
    pub blend: String,
    pub lot_number: i32,
    #[sea_orm(nullable)]
    pub shade_number: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub gross_weight: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub tare_weight: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub net_weight: Decimal,
    pub cones: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::ReportId",
        to = "super::report::Column::Id",
        on_delete = "Cascade"
    )]
    Report,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
