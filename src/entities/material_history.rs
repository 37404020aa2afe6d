use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Why a stock quantity changed. Stored as ASCII codes, shown with the
/// Thai labels the shop uses.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum HistoryAction {
    #[sea_orm(string_value = "add")]
    #[serde(rename = "เพิ่ม", alias = "add")]
    #[strum(serialize = "เพิ่ม")]
    Add,
    #[sea_orm(string_value = "delete")]
    #[serde(rename = "ลบ", alias = "delete")]
    #[strum(serialize = "ลบ")]
    Delete,
    #[sea_orm(string_value = "consume")]
    #[serde(rename = "นำไปใช้", alias = "consume")]
    #[strum(serialize = "นำไปใช้")]
    Consume,
    #[sea_orm(string_value = "return")]
    #[serde(rename = "คืนวัตถุดิบ", alias = "return")]
    #[strum(serialize = "คืนวัตถุดิบ")]
    Return,
}

impl HistoryAction {
    /// Parses either the Thai label or the stored code.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "เพิ่ม" | "add" => Some(Self::Add),
            "ลบ" | "delete" => Some(Self::Delete),
            "นำไปใช้" | "consume" => Some(Self::Consume),
            "คืนวัตถุดิบ" | "return" => Some(Self::Return),
            _ => None,
        }
    }
}

/// Append-only log row for a stock change.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "material_history")]
#[serde(rename_all = "camelCase")]
#[schema(as = MaterialHistoryEntry)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub action: HistoryAction,
    pub date: NaiveDate,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Production order that caused the change, when there is one
    pub order_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
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
        if insert {
            let now = Utc::now();
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
            if let ActiveValue::NotSet = active_model.date {
                active_model.date = Set(now.date_naive());
            }
        }
        Ok(active_model)
    }
}
