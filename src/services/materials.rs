use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::material::{self, Entity as MaterialEntity};
use crate::entities::material_history::HistoryAction;
use crate::errors::ServiceError;
use crate::services::stock::{self, HistoryRecord};

#[derive(Debug, Clone)]
pub struct AddMaterialCommand {
    pub name: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMaterialCommand {
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockOperation {
    Increase,
    Decrease,
}

#[derive(Debug, Clone)]
pub struct AdjustQuantityCommand {
    pub name: String,
    pub quantity: Decimal,
    pub operation: StockOperation,
    pub unit: Option<String>,
    pub price_per_unit: Option<Decimal>,
}

/// Raw-material inventory. Every stock change appends a history row in the
/// same transaction.
#[derive(Clone)]
pub struct MaterialService {
    db_pool: Arc<DbPool>,
    default_unit: String,
}

impl MaterialService {
    pub fn new(db_pool: Arc<DbPool>, default_unit: impl Into<String>) -> Self {
        Self {
            db_pool,
            default_unit: default_unit.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<material::Model>, ServiceError> {
        MaterialEntity::find()
            .order_by_asc(material::Column::Name)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Adds stock under `name`, creating the material if it is new.
    ///
    /// A zero quantity registers or edits the material without a history row.
    #[instrument(skip(self))]
    pub async fn add(&self, command: AddMaterialCommand) -> Result<material::Model, ServiceError> {
        let name = required_name(&command.name)?;
        ensure_not_negative(command.quantity, "quantity")?;
        if let Some(price) = command.price_per_unit {
            ensure_not_negative(price, "pricePerUnit")?;
        }
        let date = command.date.unwrap_or_else(|| Utc::now().date_naive());

        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let saved = match stock::find_by_name(&txn, &name).await? {
            Some(existing) => {
                stock::increment(&txn, existing.id, command.quantity, date).await?;
                let mut active = MaterialEntity::find_by_id(existing.id)
                    .one(&txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", name)))?
                    .into_active_model();
                if let Some(unit) = non_empty(command.unit.clone()) {
                    active.unit = Set(unit);
                }
                if let Some(price) = command.price_per_unit {
                    active.price_per_unit = Set(price);
                }
                active.update(&txn).await.map_err(ServiceError::db_error)?
            }
            None => material::ActiveModel {
                name: Set(name.clone()),
                quantity: Set(command.quantity),
                unit: Set(non_empty(command.unit.clone()).unwrap_or_else(|| self.default_unit.clone())),
                price_per_unit: Set(command.price_per_unit.unwrap_or(Decimal::ZERO)),
                date: Set(date),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?,
        };

        if !command.quantity.is_zero() {
            stock::record_history(
                &txn,
                HistoryRecord {
                    action: HistoryAction::Add,
                    date,
                    name: saved.name.clone(),
                    quantity: command.quantity,
                    unit: saved.unit.clone(),
                    order_id: None,
                    note: None,
                },
            )
            .await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("materials.added", 1);
        info!(material_id = %saved.id, name = %saved.name, added = %command.quantity, "material stock added");
        Ok(saved)
    }

    /// Edits a material. A quantity change is logged as its delta.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateMaterialCommand,
    ) -> Result<material::Model, ServiceError> {
        if let Some(quantity) = command.quantity {
            ensure_not_negative(quantity, "quantity")?;
        }
        if let Some(price) = command.price_per_unit {
            ensure_not_negative(price, "pricePerUnit")?;
        }

        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let current = MaterialEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", id)))?;

        let old_quantity = current.quantity;
        let mut active = current.clone().into_active_model();

        if let Some(name) = command.name.as_deref() {
            let name = required_name(name)?;
            if name != current.name {
                if stock::find_by_name(&txn, &name).await?.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Material {} already exists",
                        name
                    )));
                }
                active.name = Set(name);
            }
        }
        if let Some(quantity) = command.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(unit) = non_empty(command.unit.clone()) {
            active.unit = Set(unit);
        }
        if let Some(price) = command.price_per_unit {
            active.price_per_unit = Set(price);
        }
        if let Some(date) = command.date {
            active.date = Set(date);
        }

        let saved = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let delta = saved.quantity - old_quantity;
        if !delta.is_zero() {
            let action = if delta > Decimal::ZERO {
                HistoryAction::Add
            } else {
                HistoryAction::Delete
            };
            stock::record_history(
                &txn,
                HistoryRecord {
                    action,
                    date: saved.date,
                    name: saved.name.clone(),
                    quantity: delta.abs(),
                    unit: saved.unit.clone(),
                    order_id: None,
                    note: None,
                },
            )
            .await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(material_id = %id, delta = %delta, "material updated");
        Ok(saved)
    }

    /// Deletes a material, logging what was left in stock.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<material::Model, ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let existing = MaterialEntity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", id)))?;

        existing
            .clone()
            .delete(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        stock::record_history(
            &txn,
            HistoryRecord {
                action: HistoryAction::Delete,
                date: Utc::now().date_naive(),
                name: existing.name.clone(),
                quantity: existing.quantity,
                unit: existing.unit.clone(),
                order_id: None,
                note: None,
            },
        )
        .await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("materials.deleted", 1);
        info!(material_id = %id, name = %existing.name, "material deleted");
        Ok(existing)
    }

    /// Sets the unit of the material called `name`.
    #[instrument(skip(self))]
    pub async fn update_unit(&self, name: &str, unit: &str) -> Result<material::Model, ServiceError> {
        let name = required_name(name)?;
        let unit = non_empty(Some(unit.to_string()))
            .ok_or_else(|| ServiceError::ValidationError("unit must not be empty".into()))?;

        let existing = stock::find_by_name(self.db_pool.as_ref(), &name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", name)))?;

        let mut active = existing.into_active_model();
        active.unit = Set(unit);
        let saved = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        info!(name = %saved.name, unit = %saved.unit, "material unit updated");
        Ok(saved)
    }

    /// Moves stock up or down by name.
    ///
    /// Increasing an unknown material creates it; decreasing one is a 404.
    /// A decrease never takes stock below zero.
    #[instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        command: AdjustQuantityCommand,
    ) -> Result<material::Model, ServiceError> {
        let name = required_name(&command.name)?;
        if command.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "quantity must be greater than 0".into(),
            ));
        }
        if let Some(price) = command.price_per_unit {
            ensure_not_negative(price, "pricePerUnit")?;
        }
        let today = Utc::now().date_naive();

        match command.operation {
            StockOperation::Increase => {
                self.add(AddMaterialCommand {
                    name,
                    quantity: command.quantity,
                    unit: command.unit,
                    price_per_unit: command.price_per_unit,
                    date: Some(today),
                })
                .await
            }
            StockOperation::Decrease => {
                let txn = self
                    .db_pool
                    .begin()
                    .await
                    .map_err(ServiceError::db_error)?;

                let existing = stock::find_by_name(&txn, &name)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", name)))?;

                if let Err(err) = stock::decrement(&txn, &existing, command.quantity, today).await {
                    warn!(name = %name, requested = %command.quantity, available = %existing.quantity, "stock decrease refused");
                    return Err(err);
                }

                stock::record_history(
                    &txn,
                    HistoryRecord {
                        action: HistoryAction::Consume,
                        date: today,
                        name: existing.name.clone(),
                        quantity: command.quantity,
                        unit: existing.unit.clone(),
                        order_id: None,
                        note: None,
                    },
                )
                .await?;

                let saved = MaterialEntity::find_by_id(existing.id)
                    .one(&txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", name)))?;

                txn.commit().await.map_err(ServiceError::db_error)?;

                counter!("materials.consumed", 1);
                info!(name = %name, removed = %command.quantity, remaining = %saved.quantity, "material stock decreased");
                Ok(saved)
            }
        }
    }
}

fn required_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationError(
            "name must not be empty".into(),
        ));
    }
    Ok(name.to_string())
}

fn ensure_not_negative(value: Decimal, field: &str) -> Result<(), ServiceError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(required_name("  ใบตองตึง ").unwrap(), "ใบตองตึง");
        assert_matches!(required_name("   "), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(ensure_not_negative(dec!(0), "quantity").is_ok());
        assert!(ensure_not_negative(dec!(1.5), "quantity").is_ok());
        assert!(ensure_not_negative(dec!(-0.01), "quantity").is_err());
    }

    #[test]
    fn operation_parses_lowercase() {
        let op: StockOperation = serde_json::from_str("\"decrease\"").unwrap();
        assert_eq!(op, StockOperation::Decrease);
        assert_eq!(StockOperation::Increase.to_string(), "increase");
    }
}
