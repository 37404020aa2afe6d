use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::{ledger_transaction, material, material_history, production_order};
use crate::errors::ServiceError;

/// Byte-order mark so spreadsheet tools pick UTF-8 for the Thai text
const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportPeriod {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportPeriod {
    /// Restricts `query` to rows whose `column` falls inside the period, bounds inclusive.
    fn apply<E: EntityTrait>(&self, mut query: Select<E>, column: E::Column) -> Select<E> {
        if let Some(from) = self.from {
            query = query.filter(column.gte(from));
        }
        if let Some(to) = self.to {
            query = query.filter(column.lte(to));
        }
        query
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub income_total: Decimal,
    #[schema(value_type = String)]
    pub expense_total: Decimal,
    #[schema(value_type = String)]
    pub net: Decimal,
    pub order_count: u64,
    pub produced_order_count: u64,
    pub plates_produced: i64,
    #[schema(value_type = String)]
    pub material_cost_total: Decimal,
    #[schema(value_type = String)]
    pub production_cost_total: Decimal,
    #[schema(value_type = String)]
    pub sales_total: Decimal,
    #[schema(value_type = String)]
    pub inventory_value: Decimal,
    pub material_count: u64,
    pub low_stock_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum ExportDataset {
    #[strum(serialize = "materials")]
    Materials,
    #[strum(serialize = "material-history")]
    MaterialHistory,
    #[strum(serialize = "orders")]
    Orders,
    #[strum(serialize = "transactions")]
    Transactions,
}

impl ExportDataset {
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        Self::from_str(value)
            .map_err(|_| ServiceError::NotFound(format!("Unknown export dataset {}", value)))
    }
}

/// A finished CSV download
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn summary(
        &self,
        period: ReportPeriod,
        low_stock_threshold: Decimal,
    ) -> Result<ReportSummary, ServiceError> {
        let transactions = self.transactions(period).await?;
        let orders = self.orders(period).await?;
        let materials = self.materials().await?;

        let (income_total, expense_total) =
            transactions
                .iter()
                .fold((Decimal::ZERO, Decimal::ZERO), |(income, expense), t| {
                    if t.is_income {
                        (income + t.amount, expense)
                    } else {
                        (income, expense + t.amount)
                    }
                });

        let produced: Vec<_> = orders
            .iter()
            .filter(|o| o.produced_quantity.is_some())
            .collect();

        let summary = ReportSummary {
            from: period.from,
            to: period.to,
            income_total,
            expense_total,
            net: income_total - expense_total,
            order_count: orders.len() as u64,
            produced_order_count: produced.len() as u64,
            plates_produced: produced.iter().map(|o| i64::from(o.produced())).sum(),
            material_cost_total: orders.iter().map(|o| o.material_cost).sum(),
            production_cost_total: orders.iter().map(|o| o.total_cost).sum(),
            sales_total: orders.iter().map(|o| o.selling_price).sum(),
            inventory_value: materials.iter().map(material::Model::stock_value).sum(),
            material_count: materials.len() as u64,
            low_stock_count: materials
                .iter()
                .filter(|m| m.quantity <= low_stock_threshold)
                .count() as u64,
        };

        info!(net = %summary.net, orders = summary.order_count, "report summary built");
        Ok(summary)
    }

    #[instrument(skip(self))]
    pub async fn export(
        &self,
        dataset: ExportDataset,
        period: ReportPeriod,
    ) -> Result<CsvExport, ServiceError> {
        let table = match dataset {
            ExportDataset::Materials => materials_table(&self.materials().await?),
            ExportDataset::MaterialHistory => history_table(&self.history(period).await?),
            ExportDataset::Orders => orders_table(&self.orders(period).await?),
            ExportDataset::Transactions => transactions_table(&self.transactions(period).await?),
        };

        let body = table.to_delimited(',');
        info!(dataset = %dataset, rows = table.rows.len(), "export generated");
        Ok(CsvExport {
            filename: format!("{}.csv", dataset),
            body,
        })
    }

    async fn materials(&self) -> Result<Vec<material::Model>, ServiceError> {
        material::Entity::find()
            .order_by_asc(material::Column::Name)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn history(
        &self,
        period: ReportPeriod,
    ) -> Result<Vec<material_history::Model>, ServiceError> {
        period
            .apply(material_history::Entity::find(), material_history::Column::Date)
            .order_by_desc(material_history::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn orders(
        &self,
        period: ReportPeriod,
    ) -> Result<Vec<production_order::Model>, ServiceError> {
        period
            .apply(production_order::Entity::find(), production_order::Column::Date)
            .order_by_desc(production_order::Column::Date)
            .order_by_asc(production_order::Column::Lot)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn transactions(
        &self,
        period: ReportPeriod,
    ) -> Result<Vec<ledger_transaction::Model>, ServiceError> {
        period
            .apply(ledger_transaction::Entity::find(), ledger_transaction::Column::Date)
            .order_by_desc(ledger_transaction::Column::Date)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}

struct Table {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl Table {
    fn to_delimited(&self, delimiter: char) -> String {
        let separator = delimiter.to_string();
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.headers.join(&separator));
        for row in &self.rows {
            let line = row
                .iter()
                .map(|field| escape_field(field, delimiter))
                .collect::<Vec<_>>()
                .join(&separator);
            lines.push(line);
        }
        format!("{}{}\n", UTF8_BOM, lines.join("\n"))
    }
}

fn escape_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn plates(value: Option<i32>) -> String {
    value.map(|n| format!("{} จาน", n)).unwrap_or_default()
}

fn materials_table(rows: &[material::Model]) -> Table {
    Table {
        headers: &["name", "quantity", "unit", "price_per_unit", "stock_value", "date"],
        rows: rows
            .iter()
            .map(|m| {
                vec![
                    m.name.clone(),
                    m.quantity.normalize().to_string(),
                    m.unit.clone(),
                    m.price_per_unit.normalize().to_string(),
                    m.stock_value().normalize().to_string(),
                    m.date.to_string(),
                ]
            })
            .collect(),
    }
}

fn history_table(rows: &[material_history::Model]) -> Table {
    Table {
        headers: &["date", "action", "name", "quantity", "unit", "order_id", "note"],
        rows: rows
            .iter()
            .map(|h| {
                vec![
                    h.date.to_string(),
                    h.action.to_string(),
                    h.name.clone(),
                    h.quantity.normalize().to_string(),
                    h.unit.clone(),
                    opt(&h.order_id),
                    opt(&h.note),
                ]
            })
            .collect(),
    }
}

fn orders_table(rows: &[production_order::Model]) -> Table {
    Table {
        headers: &[
            "lot",
            "date",
            "product",
            "ordered_quantity",
            "produced_quantity",
            "qc_quantity",
            "material_cost",
            "electricity_cost",
            "total_cost",
            "selling_price",
            "profit",
            "status",
            "machine_id",
        ],
        rows: rows
            .iter()
            .map(|o| {
                vec![
                    o.lot.clone(),
                    o.date.to_string(),
                    o.product.clone(),
                    plates(Some(o.ordered_quantity)),
                    plates(o.produced_quantity),
                    opt(&o.qc_quantity),
                    o.material_cost.normalize().to_string(),
                    o.electricity_cost.normalize().to_string(),
                    o.total_cost.normalize().to_string(),
                    o.selling_price.normalize().to_string(),
                    o.profit().normalize().to_string(),
                    o.status.clone(),
                    opt(&o.machine_id),
                ]
            })
            .collect(),
    }
}

fn transactions_table(rows: &[ledger_transaction::Model]) -> Table {
    Table {
        headers: &[
            "date",
            "description",
            "category",
            "amount",
            "quantity",
            "type",
            "notes",
        ],
        rows: rows
            .iter()
            .map(|t| {
                vec![
                    t.date.to_string(),
                    t.description.clone(),
                    t.category.clone(),
                    t.amount.normalize().to_string(),
                    opt(&t.quantity),
                    if t.is_income { "รายรับ" } else { "รายจ่าย" }.to_string(),
                    opt(&t.notes),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a,b", "\"a,b\"")]
    #[case("say \"hi\"", "\"say \"\"hi\"\"\"")]
    #[case("two\nlines", "\"two\nlines\"")]
    #[case("ใบตองตึง", "ใบตองตึง")]
    fn fields_are_escaped(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_field(input, ','), expected);
    }

    #[rstest]
    #[case("materials", ExportDataset::Materials)]
    #[case("material-history", ExportDataset::MaterialHistory)]
    #[case("orders", ExportDataset::Orders)]
    #[case("transactions", ExportDataset::Transactions)]
    fn datasets_parse(#[case] input: &str, #[case] expected: ExportDataset) {
        assert_eq!(ExportDataset::parse(input).unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn unknown_dataset_is_not_found() {
        assert_matches!(ExportDataset::parse("users"), Err(ServiceError::NotFound(_)));
    }

    #[test]
    fn table_renders_header_then_rows() {
        let table = Table {
            headers: &["name", "note"],
            rows: vec![vec!["ถ้วย".into(), "x, y".into()]],
        };
        let csv = table.to_delimited(',');
        let csv = csv.trim_start_matches(UTF8_BOM);
        assert_eq!(csv, "name,note\nถ้วย,\"x, y\"\n");
    }
}
