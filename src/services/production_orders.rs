/*!
 * Production orders.
 *
 * Recording production takes the recipe requirement out of stock. Editing
 * the produced quantity later consumes or returns only the difference,
 * and deleting an order gives everything back. Each of these runs in a
 * single database transaction together with its history rows.
 */

use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::production_order::{
    self, Entity as OrderEntity, STATUS_PENDING, STATUS_PRODUCED,
};
use crate::errors::ServiceError;
use crate::recipes::calculate_material_needed;
use crate::services::stock;

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub lot: String,
    pub date: Option<NaiveDate>,
    pub product: String,
    pub ordered_quantity: i32,
    pub selling_price: Option<Decimal>,
    pub electricity_cost: Option<Decimal>,
    pub status: Option<String>,
    pub machine_id: Option<String>,
    pub qc_quantity: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct RecordProductionCommand {
    pub order_id: Uuid,
    pub produced_quantity: i32,
    pub qc_quantity: Option<i32>,
    pub electricity_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrderCommand {
    pub lot: Option<String>,
    pub date: Option<NaiveDate>,
    pub product: Option<String>,
    pub ordered_quantity: Option<i32>,
    pub produced_quantity: Option<i32>,
    pub qc_quantity: Option<i32>,
    pub electricity_cost: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub status: Option<String>,
    pub machine_id: Option<String>,
}

#[derive(Clone)]
pub struct ProductionOrderService {
    db_pool: Arc<DbPool>,
    default_unit: String,
}

impl ProductionOrderService {
    pub fn new(db_pool: Arc<DbPool>, default_unit: impl Into<String>) -> Self {
        Self {
            db_pool,
            default_unit: default_unit.into(),
        }
    }

    /// Newest first, then by lot
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: OrderFilter,
    ) -> Result<Vec<production_order::Model>, ServiceError> {
        let mut query = OrderEntity::find();
        if let Some(status) = trimmed(filter.status) {
            query = query.filter(production_order::Column::Status.eq(status));
        }
        if let Some(product) = trimmed(filter.product) {
            query = query.filter(production_order::Column::Product.eq(product));
        }
        query
            .order_by_desc(production_order::Column::Date)
            .order_by_asc(production_order::Column::Lot)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<production_order::Model, ServiceError> {
        find_order(self.db_pool.as_ref(), id).await
    }

    /// Creates an order. Nothing is consumed until production is recorded.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        command: CreateOrderCommand,
    ) -> Result<production_order::Model, ServiceError> {
        let lot = required(&command.lot, "lot")?;
        let product = required(&command.product, "product")?;
        non_negative_count(command.ordered_quantity, "orderedQuantity")?;
        if let Some(qc) = command.qc_quantity {
            non_negative_count(qc, "qcQuantity")?;
        }
        let electricity_cost = command.electricity_cost.unwrap_or(Decimal::ZERO);
        let selling_price = command.selling_price.unwrap_or(Decimal::ZERO);
        non_negative_money(electricity_cost, "electricityCost")?;
        non_negative_money(selling_price, "sellingPrice")?;

        let order = production_order::ActiveModel {
            lot: Set(lot),
            date: Set(command.date.unwrap_or_else(|| Utc::now().date_naive())),
            product: Set(product),
            ordered_quantity: Set(command.ordered_quantity),
            produced_quantity: Set(None),
            qc_quantity: Set(command.qc_quantity),
            electricity_cost: Set(electricity_cost),
            material_cost: Set(Decimal::ZERO),
            total_cost: Set(electricity_cost),
            selling_price: Set(selling_price),
            status: Set(trimmed(command.status).unwrap_or_else(|| STATUS_PENDING.to_string())),
            machine_id: Set(trimmed(command.machine_id)),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        counter!("orders.created", 1);
        info!(order_id = %order.id, lot = %order.lot, product = %order.product, "production order created");
        Ok(order)
    }

    /// Records the produced quantity once and consumes its materials.
    #[instrument(skip(self))]
    pub async fn record_production(
        &self,
        command: RecordProductionCommand,
    ) -> Result<production_order::Model, ServiceError> {
        if command.produced_quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "producedQuantity must be greater than 0".into(),
            ));
        }
        if let Some(qc) = command.qc_quantity {
            non_negative_count(qc, "qcQuantity")?;
        }
        if let Some(cost) = command.electricity_cost {
            non_negative_money(cost, "electricityCost")?;
        }

        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let order = find_order(&txn, command.order_id).await?;
        if order.produced_quantity.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Production for lot {} is already recorded; edit the order instead",
                order.lot
            )));
        }

        let requirement =
            calculate_material_needed(&order.product, i64::from(command.produced_quantity));
        let today = Utc::now().date_naive();
        if let Err(err) = stock::consume_materials(
            &txn,
            &requirement,
            today,
            Some(order.id),
            Some(lot_note(&order.lot)),
        )
        .await
        {
            warn!(order_id = %order.id, error = %err, "production refused");
            return Err(err);
        }

        let material_cost = stock::price_requirement(&txn, &requirement).await?;
        let electricity_cost = command.electricity_cost.unwrap_or(order.electricity_cost);

        let mut active = order.into_active_model();
        active.produced_quantity = Set(Some(command.produced_quantity));
        if let Some(qc) = command.qc_quantity {
            active.qc_quantity = Set(Some(qc));
        }
        active.electricity_cost = Set(electricity_cost);
        active.material_cost = Set(material_cost);
        active.total_cost = Set(material_cost + electricity_cost);
        active.status = Set(STATUS_PRODUCED.to_string());
        let saved = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("orders.production_recorded", 1);
        info!(
            order_id = %saved.id,
            produced = command.produced_quantity,
            material_cost = %saved.material_cost,
            "production recorded"
        );
        Ok(saved)
    }

    /// Edits an order, reconciling stock when the produced quantity or the
    /// product changes.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateOrderCommand,
    ) -> Result<production_order::Model, ServiceError> {
        if let Some(q) = command.ordered_quantity {
            non_negative_count(q, "orderedQuantity")?;
        }
        if let Some(q) = command.produced_quantity {
            non_negative_count(q, "producedQuantity")?;
        }
        if let Some(q) = command.qc_quantity {
            non_negative_count(q, "qcQuantity")?;
        }
        if let Some(cost) = command.electricity_cost {
            non_negative_money(cost, "electricityCost")?;
        }
        if let Some(price) = command.selling_price {
            non_negative_money(price, "sellingPrice")?;
        }

        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let order = find_order(&txn, id).await?;
        // Zero plates on an unproduced order is not a recording; leave it open.
        let produced_quantity = match command.produced_quantity {
            Some(0) if order.produced_quantity.is_none() => None,
            other => other,
        };
        let old_produced = order.produced();
        let new_produced = produced_quantity.unwrap_or(old_produced);
        let old_product = order.product.clone();
        let new_product = match command.product.as_deref() {
            Some(p) => required(p, "product")?,
            None => old_product.clone(),
        };

        let quantity_changed = produced_quantity.is_some() && new_produced != old_produced;
        let product_changed = new_product != old_product && (old_produced > 0 || new_produced > 0);
        let today = Utc::now().date_naive();
        let note = Some(lot_note(command.lot.as_deref().unwrap_or(&order.lot)));

        if product_changed {
            // Different recipe: give back the old lot in full, take the new one in full.
            let old_requirement = calculate_material_needed(&old_product, i64::from(old_produced));
            stock::return_materials(
                &txn,
                &old_requirement,
                &self.default_unit,
                today,
                Some(order.id),
                note.clone(),
            )
            .await?;
            let new_requirement = calculate_material_needed(&new_product, i64::from(new_produced));
            stock::consume_materials(&txn, &new_requirement, today, Some(order.id), note.clone())
                .await?;
        } else if quantity_changed {
            let diff = i64::from((new_produced - old_produced).abs());
            let requirement = calculate_material_needed(&new_product, diff);
            if new_produced < old_produced {
                stock::return_materials(
                    &txn,
                    &requirement,
                    &self.default_unit,
                    today,
                    Some(order.id),
                    note.clone(),
                )
                .await?;
            } else {
                stock::consume_materials(&txn, &requirement, today, Some(order.id), note.clone())
                    .await?;
            }
            info!(order_id = %order.id, old = old_produced, new = new_produced, "production quantity reconciled");
        }

        let material_cost = if quantity_changed || product_changed {
            let full = calculate_material_needed(&new_product, i64::from(new_produced));
            stock::price_requirement(&txn, &full).await?
        } else {
            order.material_cost
        };
        let electricity_cost = command.electricity_cost.unwrap_or(order.electricity_cost);
        let was_unproduced = order.produced_quantity.is_none();

        let mut active = order.into_active_model();
        if let Some(lot) = command.lot.as_deref() {
            active.lot = Set(required(lot, "lot")?);
        }
        if let Some(date) = command.date {
            active.date = Set(date);
        }
        active.product = Set(new_product);
        if let Some(q) = command.ordered_quantity {
            active.ordered_quantity = Set(q);
        }
        if let Some(q) = produced_quantity {
            active.produced_quantity = Set(Some(q));
        }
        if let Some(q) = command.qc_quantity {
            active.qc_quantity = Set(Some(q));
        }
        if let Some(price) = command.selling_price {
            active.selling_price = Set(price);
        }
        if let Some(machine_id) = command.machine_id {
            active.machine_id = Set(trimmed(Some(machine_id)));
        }
        match trimmed(command.status) {
            Some(status) => active.status = Set(status),
            None if was_unproduced && produced_quantity.is_some() => {
                active.status = Set(STATUS_PRODUCED.to_string())
            }
            None => {}
        }
        active.electricity_cost = Set(electricity_cost);
        active.material_cost = Set(material_cost);
        active.total_cost = Set(material_cost + electricity_cost);

        let saved = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(order_id = %saved.id, total_cost = %saved.total_cost, "production order updated");
        Ok(saved)
    }

    /// Deletes an order and returns everything it consumed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<production_order::Model, ServiceError> {
        let txn = self
            .db_pool
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let order = find_order(&txn, id).await?;
        let produced = order.produced();
        if produced > 0 {
            let requirement = calculate_material_needed(&order.product, i64::from(produced));
            stock::return_materials(
                &txn,
                &requirement,
                &self.default_unit,
                Utc::now().date_naive(),
                Some(order.id),
                Some(lot_note(&order.lot)),
            )
            .await?;
        }

        order
            .clone()
            .delete(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("orders.deleted", 1);
        info!(order_id = %id, returned_plates = produced, "production order deleted");
        Ok(order)
    }
}

async fn find_order<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<production_order::Model, ServiceError> {
    OrderEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
}

fn lot_note(lot: &str) -> String {
    format!("lot {}", lot)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    trimmed(Some(value.to_string()))
        .ok_or_else(|| ServiceError::ValidationError(format!("{} must not be empty", field)))
}

fn non_negative_count(value: i32, field: &str) -> Result<(), ServiceError> {
    if value < 0 {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

fn non_negative_money(value: Decimal, field: &str) -> Result<(), ServiceError> {
    if value < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(required(" L-001 ", "lot").unwrap(), "L-001");
        assert!(required("  ", "lot").is_err());
    }

    #[test]
    fn negative_inputs_are_rejected() {
        assert!(non_negative_count(-1, "orderedQuantity").is_err());
        assert!(non_negative_count(0, "orderedQuantity").is_ok());
        assert!(non_negative_money(dec!(-5), "sellingPrice").is_err());
    }
}
