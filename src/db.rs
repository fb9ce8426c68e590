pub mod store;
pub use store::{CatalogStore, InventoryStore, KitStore, LedgerStore, ProductionStore, StoreTx};

pub mod catalog_repo;
pub mod kit_repo;
pub mod ledger_repo;
pub mod production_repo;

pub mod postgres;
pub use postgres::PgStore;

pub mod memory;
pub use memory::MemoryStore;
