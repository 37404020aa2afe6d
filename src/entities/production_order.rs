use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PRODUCED: &str = "produced";

/// A production lot. Quantities are whole plates.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "production_orders")]
#[serde(rename_all = "camelCase")]
#[schema(as = ProductionOrder)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub lot: String,
    pub date: NaiveDate,
    pub product: String,
    pub ordered_quantity: i32,
    /// `None` until production has been recorded
    pub produced_quantity: Option<i32>,
    pub qc_quantity: Option<i32>,
    pub electricity_cost: Decimal,
    pub material_cost: Decimal,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub status: String,
    pub machine_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}

impl Model {
    /// Produced plates, treating "not yet produced" as zero
    pub fn produced(&self) -> i32 {
        self.produced_quantity.unwrap_or(0)
    }

    pub fn profit(&self) -> Decimal {
        self.selling_price - self.total_cost
    }
}
