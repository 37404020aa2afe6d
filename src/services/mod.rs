// Stock primitives shared by the material, history and order services
pub mod stock;

// Inventory
pub mod material_history;
pub mod materials;

// Production
pub mod production_orders;

// Bookkeeping and reporting
pub mod ledger;
pub mod reports;

// Accounts
pub mod users;
