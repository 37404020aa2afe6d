//! Stock movements shared by the material and production-order services.
//!
//! Every function here takes a `ConnectionTrait` so callers can run them
//! inside their own database transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::material::{self, Entity as MaterialEntity};
use crate::entities::material_history::{self, HistoryAction};
use crate::errors::ServiceError;
use crate::recipes::MaterialRequirement;

/// Fields for one history row.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub action: HistoryAction,
    pub date: NaiveDate,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub order_id: Option<Uuid>,
    pub note: Option<String>,
}

pub async fn record_history<C: ConnectionTrait>(
    conn: &C,
    record: HistoryRecord,
) -> Result<material_history::Model, ServiceError> {
    let row = material_history::ActiveModel {
        action: Set(record.action),
        date: Set(record.date),
        name: Set(record.name),
        quantity: Set(record.quantity),
        unit: Set(record.unit),
        order_id: Set(record.order_id),
        note: Set(record.note),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    debug!(action = %row.action, name = %row.name, quantity = %row.quantity, "material history appended");
    Ok(row)
}

pub async fn find_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<material::Model>, ServiceError> {
    MaterialEntity::find()
        .filter(material::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

pub fn insufficient_stock(name: &str, needed: Decimal, available: Decimal) -> ServiceError {
    ServiceError::InsufficientStock(format!(
        "วัตถุดิบ {} ไม่เพียงพอ (ต้องการ {}, คงเหลือ {})",
        name,
        needed.normalize(),
        available.normalize()
    ))
}

/// Checks that every material in `requirement` exists with enough stock.
///
/// Returns the current rows keyed by name so the caller can price them.
pub async fn check_availability<C: ConnectionTrait>(
    conn: &C,
    requirement: &MaterialRequirement,
) -> Result<BTreeMap<String, material::Model>, ServiceError> {
    let mut found = BTreeMap::new();
    for (name, needed) in requirement {
        match find_by_name(conn, name).await? {
            Some(row) if row.quantity >= *needed => {
                found.insert(name.clone(), row);
            }
            Some(row) => return Err(insufficient_stock(name, *needed, row.quantity)),
            None => return Err(insufficient_stock(name, *needed, Decimal::ZERO)),
        }
    }
    Ok(found)
}

/// Decrements one material by `amount`, refusing to go below zero.
///
/// The check and the write are a single statement, so two concurrent
/// decrements cannot both pass against the same stock.
pub async fn decrement<C: ConnectionTrait>(
    conn: &C,
    material: &material::Model,
    amount: Decimal,
    date: NaiveDate,
) -> Result<(), ServiceError> {
    let result = MaterialEntity::update_many()
        .col_expr(
            material::Column::Quantity,
            Expr::col(material::Column::Quantity).sub(amount),
        )
        .col_expr(material::Column::Date, Expr::value(date))
        .col_expr(material::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(material::Column::Id.eq(material.id))
        .filter(material::Column::Quantity.gte(amount))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        let available = MaterialEntity::find_by_id(material.id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .map(|m| m.quantity)
            .unwrap_or(Decimal::ZERO);
        return Err(insufficient_stock(&material.name, amount, available));
    }
    Ok(())
}

/// Increments one material by `amount`.
pub async fn increment<C: ConnectionTrait>(
    conn: &C,
    material_id: Uuid,
    amount: Decimal,
    date: NaiveDate,
) -> Result<(), ServiceError> {
    let result = MaterialEntity::update_many()
        .col_expr(
            material::Column::Quantity,
            Expr::col(material::Column::Quantity).add(amount),
        )
        .col_expr(material::Column::Date, Expr::value(date))
        .col_expr(material::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(material::Column::Id.eq(material_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Material {} not found",
            material_id
        )));
    }
    Ok(())
}

/// Takes a whole requirement out of stock, all or nothing.
///
/// Run it inside a transaction: a failure part way leaves earlier
/// decrements for the caller's rollback.
pub async fn consume_materials<C: ConnectionTrait>(
    conn: &C,
    requirement: &MaterialRequirement,
    date: NaiveDate,
    order_id: Option<Uuid>,
    note: Option<String>,
) -> Result<BTreeMap<String, material::Model>, ServiceError> {
    let available = check_availability(conn, requirement).await?;

    for (name, amount) in requirement {
        if amount.is_zero() {
            continue;
        }
        let Some(row) = available.get(name) else {
            continue;
        };
        decrement(conn, row, *amount, date).await?;
        record_history(
            conn,
            HistoryRecord {
                action: HistoryAction::Consume,
                date,
                name: name.clone(),
                quantity: *amount,
                unit: row.unit.clone(),
                order_id,
                note: note.clone(),
            },
        )
        .await?;
        info!(material = %name, amount = %amount, order_id = ?order_id, "material consumed");
    }

    Ok(available)
}

/// Puts a requirement back into stock.
///
/// A material that was deleted in the meantime is recreated with
/// `default_unit` and a zero price.
pub async fn return_materials<C: ConnectionTrait>(
    conn: &C,
    requirement: &MaterialRequirement,
    default_unit: &str,
    date: NaiveDate,
    order_id: Option<Uuid>,
    note: Option<String>,
) -> Result<(), ServiceError> {
    for (name, amount) in requirement {
        if amount.is_zero() {
            continue;
        }

        let unit = match find_by_name(conn, name).await? {
            Some(row) => {
                increment(conn, row.id, *amount, date).await?;
                row.unit
            }
            None => {
                let created = material::ActiveModel {
                    name: Set(name.clone()),
                    quantity: Set(*amount),
                    unit: Set(default_unit.to_string()),
                    price_per_unit: Set(Decimal::ZERO),
                    date: Set(date),
                    ..Default::default()
                }
                .insert(conn)
                .await
                .map_err(ServiceError::db_error)?;
                info!(material = %name, "recreated missing material on return");
                created.unit
            }
        };

        record_history(
            conn,
            HistoryRecord {
                action: HistoryAction::Return,
                date,
                name: name.clone(),
                quantity: *amount,
                unit,
                order_id,
                note: note.clone(),
            },
        )
        .await?;
        info!(material = %name, amount = %amount, order_id = ?order_id, "material returned");
    }
    Ok(())
}

/// Prices a requirement at the current unit prices. Materials that do not
/// exist contribute nothing.
pub async fn price_requirement<C: ConnectionTrait>(
    conn: &C,
    requirement: &MaterialRequirement,
) -> Result<Decimal, ServiceError> {
    let mut total = Decimal::ZERO;
    for (name, amount) in requirement {
        if let Some(row) = find_by_name(conn, name).await? {
            total += *amount * row.price_per_unit;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_stock_message_is_thai_and_normalized() {
        let err = insufficient_stock("ใบตองตึง", dec!(40.00), dec!(12.0));
        assert_eq!(
            err.to_string(),
            "Insufficient stock: วัตถุดิบ ใบตองตึง ไม่เพียงพอ (ต้องการ 40, คงเหลือ 12)"
        );
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
