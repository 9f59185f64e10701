mod common;

use rust_decimal_macros::dec;

use campus_rental_api::errors::ServiceError;

use common::{create_request, current_stock, identity, seed_item, setup_state};

/// Two applicants race for overlapping quantities of the same item. The
/// per-write stock guard must let exactly one commit; the loser gets an
/// InsufficientStock error and no partial writes remain.
#[tokio::test]
async fn overlapping_reservations_admit_exactly_one_winner() {
    let state = setup_state().await;
    let item = seed_item(&state, "generator", 10, dec!(50)).await;

    let first = state
        .applications
        .create_application(create_request(&identity("race-a"), vec![(item.id, 6)]));
    let second = state
        .applications
        .create_application(create_request(&identity("race-b"), vec![(item.id, 6)]));

    let (first, second) = tokio::join!(first, second);

    let outcomes = [first, second];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one reservation may win: {:?}", outcomes);

    let loser = outcomes
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one loser");
    assert!(matches!(loser, ServiceError::InsufficientStock { .. }));

    // only the winner's 6 units are held
    assert_eq!(current_stock(&state, item.id).await, 4);

    let ledger = state
        .applications
        .admin_list_applications(1, 50, None)
        .await
        .unwrap();
    assert_eq!(ledger.total, 1);
}

/// Sequential requests that together exceed stock: later ones fail cleanly
/// and stock never goes negative.
#[tokio::test]
async fn oversubscription_never_drives_stock_negative() {
    let state = setup_state().await;
    let item = seed_item(&state, "heater", 5, dec!(10)).await;

    let mut successes = 0;
    for n in 0..4 {
        let who = identity(&format!("bulk-{}", n));
        match state
            .applications
            .create_application(create_request(&who, vec![(item.id, 2)]))
            .await
        {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientStock { available, .. }) => {
                assert!(available >= 0);
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(current_stock(&state, item.id).await, 1);
}
