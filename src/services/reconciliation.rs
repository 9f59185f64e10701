//! Stock Reconciliation Engine
//!
//! Given a rental application's OLD state and DESIRED new state (items plus
//! lifecycle status), computes the minimal set of per-item inventory deltas
//! required to keep item stock consistent with the conservation rule: stock
//! held by PENDING/RENTED applications plus free `current_stock` always
//! equals `initial_stock`.
//!
//! The engine nets quantity changes within one reserved lifetime instead of
//! releasing the old amount and re-reserving the new one, so a quantity edit
//! from 5 to 3 moves exactly 2 units and cannot be falsely rejected by a
//! concurrent reservation holding the rest.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;
use uuid::Uuid;

use crate::entities::rental_application::ApplicationStatus;
use crate::errors::ServiceError;

/// One item+quantity entry of an application, as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedItem {
    pub item_id: Uuid,
    pub quantity: i32,
}

/// The (status, items) pair of an application on one side of a transition.
#[derive(Debug, Clone)]
pub struct ReservationState<'a> {
    pub status: ApplicationStatus,
    pub items: &'a [SelectedItem],
}

/// Inventory levels for one item at the time the transition is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct StockSnapshot {
    pub current_stock: i32,
    pub initial_stock: i32,
}

fn quantities(state: Option<&ReservationState<'_>>) -> HashMap<Uuid, i32> {
    match state {
        Some(s) => s
            .items
            .iter()
            .map(|entry| (entry.item_id, entry.quantity))
            .collect(),
        None => HashMap::new(),
    }
}

fn is_reserved(state: Option<&ReservationState<'_>>) -> bool {
    state.map(|s| s.status.is_reserved()).unwrap_or(false)
}

/// Computes the per-item stock deltas (amount to ADD to `current_stock`;
/// negative reserves) for moving an application from `old` to `new`.
///
/// `None` on either side models a not-yet-created or deleted application.
/// Validation runs against a running simulated stock level per item, so the
/// whole batch either fits within the supplied snapshot or fails with
/// `InsufficientStock`. Deltas of exactly zero are omitted.
///
/// Positive deltas that would push an item past its `initial_stock` are
/// clamped to `initial_stock - current_stock`; the discarded remainder is
/// logged but never an error.
pub fn reconcile(
    old: Option<&ReservationState<'_>>,
    new: Option<&ReservationState<'_>>,
    inventory: &HashMap<Uuid, StockSnapshot>,
) -> Result<BTreeMap<Uuid, i32>, ServiceError> {
    let old_reserved = is_reserved(old);
    let new_reserved = is_reserved(new);
    let old_qty = quantities(old);
    let new_qty = quantities(new);

    // BTreeSet gives a deterministic apply order downstream.
    let touched: BTreeSet<Uuid> = old_qty.keys().chain(new_qty.keys()).copied().collect();

    let mut deltas = BTreeMap::new();
    let mut simulated: HashMap<Uuid, i32> = HashMap::new();

    for item_id in touched {
        let oq = old_qty.get(&item_id).copied().unwrap_or(0);
        let nq = new_qty.get(&item_id).copied().unwrap_or(0);

        let mut delta = match (old_reserved, new_reserved) {
            (true, false) => oq,
            (false, true) => -nq,
            (true, true) => oq - nq,
            (false, false) => 0,
        };

        if delta == 0 {
            continue;
        }

        let snapshot = inventory
            .get(&item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", item_id)))?;

        let level = simulated
            .entry(item_id)
            .or_insert(snapshot.current_stock);

        if *level + delta < 0 {
            return Err(ServiceError::InsufficientStock {
                item_id,
                requested: -delta,
                available: *level,
            });
        }

        if delta > 0 && *level + delta > snapshot.initial_stock {
            let capped = snapshot.initial_stock - *level;
            warn!(
                item_id = %item_id,
                requested_release = delta,
                applied_release = capped,
                "stock release exceeds initial stock; clamping"
            );
            delta = capped;
            if delta == 0 {
                continue;
            }
        }

        *level += delta;
        deltas.insert(item_id, delta);
    }

    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u128, quantity: i32) -> SelectedItem {
        SelectedItem {
            item_id: Uuid::from_u128(id),
            quantity,
        }
    }

    fn inventory(entries: &[(u128, i32, i32)]) -> HashMap<Uuid, StockSnapshot> {
        entries
            .iter()
            .map(|&(id, current, initial)| {
                (
                    Uuid::from_u128(id),
                    StockSnapshot {
                        current_stock: current,
                        initial_stock: initial,
                    },
                )
            })
            .collect()
    }

    fn pending(items: &[SelectedItem]) -> ReservationState<'_> {
        ReservationState {
            status: ApplicationStatus::Pending,
            items,
        }
    }

    fn rented(items: &[SelectedItem]) -> ReservationState<'_> {
        ReservationState {
            status: ApplicationStatus::Rented,
            items,
        }
    }

    fn returned(items: &[SelectedItem]) -> ReservationState<'_> {
        ReservationState {
            status: ApplicationStatus::Returned,
            items,
        }
    }

    #[test]
    fn create_reserves_full_quantities() {
        let items = [item(1, 4), item(2, 1)];
        let inv = inventory(&[(1, 10, 10), (2, 5, 5)]);
        let deltas = reconcile(None, Some(&pending(&items)), &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&-4));
        assert_eq!(deltas.get(&Uuid::from_u128(2)), Some(&-1));
    }

    #[test]
    fn cancel_releases_full_quantities() {
        let items = [item(1, 4)];
        let inv = inventory(&[(1, 6, 10)]);
        let deltas = reconcile(Some(&pending(&items)), None, &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&4));
    }

    #[test]
    fn identity_edit_produces_no_deltas() {
        let items = [item(1, 3)];
        let inv = inventory(&[(1, 7, 10)]);
        let deltas = reconcile(Some(&pending(&items)), Some(&pending(&items)), &inv).unwrap();
        assert!(deltas.is_empty());
    }

    #[test]
    fn quantity_reduction_nets_the_difference() {
        let old = [item(1, 5)];
        let new = [item(1, 3)];
        let inv = inventory(&[(1, 5, 10)]);
        let deltas = reconcile(Some(&pending(&old)), Some(&pending(&new)), &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&2));
    }

    #[test]
    fn quantity_increase_nets_the_difference() {
        let old = [item(1, 2)];
        let new = [item(1, 5)];
        let inv = inventory(&[(1, 8, 10)]);
        let deltas = reconcile(Some(&pending(&old)), Some(&pending(&new)), &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&-3));
    }

    #[test]
    fn status_change_within_reserved_states_moves_nothing() {
        let items = [item(1, 3)];
        let inv = inventory(&[(1, 7, 10)]);
        let deltas = reconcile(Some(&pending(&items)), Some(&rented(&items)), &inv).unwrap();
        assert!(deltas.is_empty());
    }

    #[test]
    fn transition_to_returned_releases_everything() {
        let items = [item(1, 4)];
        let inv = inventory(&[(1, 6, 10)]);
        let deltas = reconcile(Some(&rented(&items)), Some(&returned(&items)), &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&4));
    }

    #[test]
    fn admin_reintroducing_items_from_returned_reserves_again() {
        let items = [item(1, 2)];
        let inv = inventory(&[(1, 10, 10)]);
        let deltas = reconcile(Some(&returned(&items)), Some(&pending(&items)), &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&-2));
    }

    #[test]
    fn item_swap_releases_one_and_reserves_the_other() {
        let old = [item(1, 2)];
        let new = [item(2, 3)];
        let inv = inventory(&[(1, 8, 10), (2, 5, 5)]);
        let deltas = reconcile(Some(&pending(&old)), Some(&pending(&new)), &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&2));
        assert_eq!(deltas.get(&Uuid::from_u128(2)), Some(&-3));
    }

    #[test]
    fn reserving_exactly_available_stock_succeeds() {
        let items = [item(1, 10)];
        let inv = inventory(&[(1, 10, 10)]);
        let deltas = reconcile(None, Some(&pending(&items)), &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&-10));
    }

    #[test]
    fn reserving_one_over_available_fails_with_quantities() {
        let items = [item(1, 11)];
        let inv = inventory(&[(1, 10, 10)]);
        let err = reconcile(None, Some(&pending(&items)), &inv).unwrap_err();
        match err {
            ServiceError::InsufficientStock {
                item_id,
                requested,
                available,
            } => {
                assert_eq!(item_id, Uuid::from_u128(1));
                assert_eq!(requested, 11);
                assert_eq!(available, 10);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn release_is_clamped_to_initial_stock() {
        // Stored reservation of 5 against an item whose initial stock was
        // later reduced; releasing all 5 would overshoot.
        let items = [item(1, 5)];
        let inv = inventory(&[(1, 1, 4)]);
        let deltas = reconcile(Some(&pending(&items)), None, &inv).unwrap();
        assert_eq!(deltas.get(&Uuid::from_u128(1)), Some(&3));
    }

    #[test]
    fn fully_clamped_release_is_omitted() {
        let items = [item(1, 5)];
        let inv = inventory(&[(1, 4, 4)]);
        let deltas = reconcile(Some(&pending(&items)), None, &inv).unwrap();
        assert!(deltas.is_empty());
    }

    #[test]
    fn unknown_item_in_state_is_an_error() {
        let items = [item(9, 1)];
        let inv = inventory(&[(1, 10, 10)]);
        let err = reconcile(None, Some(&pending(&items)), &inv).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn non_reserved_transition_moves_nothing() {
        let items = [item(1, 3)];
        let inv = inventory(&[(1, 10, 10)]);
        let deltas = reconcile(Some(&returned(&items)), None, &inv).unwrap();
        assert!(deltas.is_empty());
    }
}
