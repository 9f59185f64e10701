pub mod applications;
pub mod catalog;
pub mod costs;
pub mod reconciliation;
