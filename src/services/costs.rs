//! Cost Calculator
//!
//! Pure computation of the derived money fields of a rental application.
//! Costs are recomputed from current prices on every create/edit so they
//! stay authoritative and cannot be tampered with by client input.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::reconciliation::SelectedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub total_item_cost: Decimal,
    pub total_amount: Decimal,
}

/// Computes `total_item_cost = sum(price * quantity)` and
/// `total_amount = total_item_cost + deposit`.
///
/// An item id that does not resolve in the price list fails the whole
/// calculation with `NotFound` rather than silently contributing zero.
pub fn compute_costs(
    items: &[SelectedItem],
    price_list: &HashMap<Uuid, Decimal>,
    deposit: Decimal,
) -> Result<CostBreakdown, ServiceError> {
    let mut total_item_cost = Decimal::ZERO;

    for entry in items {
        let price = price_list.get(&entry.item_id).ok_or_else(|| {
            ServiceError::NotFound(format!("item {} not found in price list", entry.item_id))
        })?;
        total_item_cost += *price * Decimal::from(entry.quantity);
    }

    Ok(CostBreakdown {
        total_item_cost,
        total_amount: total_item_cost + deposit,
    })
}
