use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Packing report / delivery challan header.
///
/// The `total_*` columns are denormalised sums over the report's items and are
/// rewritten whenever the items change.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_id: i32,
    pub challan_no: i32,
    pub report_date: NaiveDate,
    pub quality_name: String,
    pub denier: i32,
    pub blend: String,
    pub lot_number: i32,
    #[sea_orm(nullable)]
    pub shade_number: Option<String>,
    #[sea_orm(nullable)]
    pub vehicle_no: Option<String>,
    #[sea_orm(nullable)]
    pub driver_name: Option<String>,
    #[sea_orm(nullable)]
    pub destination: Option<String>,
    #[sea_orm(nullable)]
    pub purpose: Option<String>,
    pub total_bags: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub total_gross_weight: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub total_tare_weight: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 3)))")]
    pub total_net_weight: Decimal,
    pub total_cones: i32,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    #[sea_orm(has_many = "super::report_item::Entity")]
    Items,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::report_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        } else if !active_model.updated_at.is_set() {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
