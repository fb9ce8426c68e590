pub mod catalog_service;
pub use catalog_service::CatalogService;
pub mod kit_service;
pub use kit_service::KitService;
pub mod ledger_service;
pub use ledger_service::LedgerService;
pub mod production_service;
pub use production_service::ProductionService;
