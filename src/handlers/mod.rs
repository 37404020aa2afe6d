pub mod auth;
pub mod common;
pub mod material_history;
pub mod materials;
pub mod orders;
pub mod recipes;
pub mod reports;
pub mod transactions;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{
    ledger::LedgerService, material_history::MaterialHistoryService, materials::MaterialService,
    production_orders::ProductionOrderService, reports::ReportService, users::UserService,
};
use std::sync::Arc;

pub use crate::AppState;

/// Service container shared by every handler through [`AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub materials: Arc<MaterialService>,
    pub material_history: Arc<MaterialHistoryService>,
    pub orders: Arc<ProductionOrderService>,
    pub ledger: Arc<LedgerService>,
    pub users: Arc<UserService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig, auth_service: Arc<AuthService>) -> Self {
        let default_unit = config.default_material_unit.clone();

        Self {
            materials: Arc::new(MaterialService::new(db_pool.clone(), default_unit.clone())),
            material_history: Arc::new(MaterialHistoryService::new(
                db_pool.clone(),
                default_unit.clone(),
            )),
            orders: Arc::new(ProductionOrderService::new(db_pool.clone(), default_unit)),
            ledger: Arc::new(LedgerService::new(db_pool.clone())),
            users: Arc::new(UserService::new(db_pool.clone(), auth_service)),
            reports: Arc::new(ReportService::new(db_pool)),
        }
    }
}
