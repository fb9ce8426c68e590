pub mod catalog;
pub mod kit;
pub mod ledger;
pub mod production;
