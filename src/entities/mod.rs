pub mod ledger_transaction;
pub mod material;
pub mod material_history;
pub mod production_order;
