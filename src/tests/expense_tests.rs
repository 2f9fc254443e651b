use crate::constants::{EXPENSE_RECORDED, RECALCULATION_PUBLISH_FAILED, RECALCULATION_REQUESTED};
use crate::core::errors::LedgerError;
use crate::core::models::message::RecalculationRequest;
use crate::infrastructure::queue::MessageQueue;
use crate::tests::{QUEUE, harness, new_expense};
use crate::worker::ProcessOutcome;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_add_expense_stores_and_enqueues_request() {
    let h = harness().await;
    let group = h.group(&["Alice", "Bob", "Charlie"]).await;

    let expense = h
        .ledger
        .add_expense(
            &group.id,
            new_expense("Dinner", dec!(1500), "Alice", &["Alice", "Bob", "Charlie"]),
        )
        .await
        .unwrap();

    assert_eq!(expense.group_id, group.id);
    assert_eq!(h.ledger.get_expenses(&group.id).await.unwrap(), vec![expense.clone()]);
    assert_eq!(h.queue.ready_count(QUEUE).await, 1);

    let delivery = h.queue.receive(QUEUE).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&delivery.body).unwrap();
    assert_eq!(body["groupId"], group.id.as_str());
    assert_eq!(body["expenseId"], expense.id.as_str());
    assert_eq!(body["amount"].as_f64(), Some(1500.0));

    assert_eq!(h.logging.logs_for(EXPENSE_RECORDED).await.len(), 1);
    assert_eq!(h.logging.logs_for(RECALCULATION_REQUESTED).await.len(), 1);
}

#[tokio::test]
async fn test_add_expense_validation_rejects_before_storing() {
    let h = harness().await;
    let group = h.group(&["Alice", "Bob"]).await;

    let cases = vec![
        new_expense("Dinner", dec!(0), "Alice", &["Alice", "Bob"]),
        new_expense("Dinner", dec!(-5), "Alice", &["Alice", "Bob"]),
        new_expense("Dinner", dec!(10.005), "Alice", &["Alice", "Bob"]),
        new_expense("Dinner", dec!(1000000.01), "Alice", &["Alice", "Bob"]),
        new_expense("", dec!(10), "Alice", &["Alice", "Bob"]),
        new_expense("Dinner", dec!(10), "Alice", &[]),
        new_expense("Dinner", dec!(10), "Alice", &["Alice", "Alice"]),
    ];
    for case in cases {
        let result = h.ledger.add_expense(&group.id, case).await;
        assert!(matches!(result, Err(LedgerError::InvalidInput(..))), "{:?}", result);
    }

    let outsider_payer = h
        .ledger
        .add_expense(&group.id, new_expense("Dinner", dec!(10), "Mallory", &["Alice"]))
        .await;
    assert_eq!(outsider_payer, Err(LedgerError::InvalidSplitUser("Mallory".to_string())));

    let outsider_participant = h
        .ledger
        .add_expense(&group.id, new_expense("Dinner", dec!(10), "Alice", &["Alice", "Mallory"]))
        .await;
    assert_eq!(outsider_participant, Err(LedgerError::InvalidSplitUser("Mallory".to_string())));

    assert!(h.ledger.get_expenses(&group.id).await.unwrap().is_empty());
    assert_eq!(h.queue.ready_count(QUEUE).await, 0);
}

#[tokio::test]
async fn test_add_expense_to_unknown_group() {
    let h = harness().await;
    let missing = uuid::Uuid::new_v4().to_string();

    let result = h
        .ledger
        .add_expense(&missing, new_expense("Dinner", dec!(10), "Alice", &["Alice"]))
        .await;

    assert_eq!(result, Err(LedgerError::GroupNotFound(missing)));
}

#[tokio::test]
async fn test_store_failure_does_not_enqueue() {
    let h = harness().await;
    let group = h.group(&["Alice", "Bob"]).await;
    h.storage.fail_next_expense_inserts(1);

    let result = h
        .ledger
        .add_expense(&group.id, new_expense("Dinner", dec!(10), "Alice", &["Bob"]))
        .await;

    assert!(matches!(result, Err(LedgerError::StorageError(_))));
    assert_eq!(h.queue.ready_count(QUEUE).await, 0);
}

#[tokio::test]
async fn test_publish_failure_keeps_expense_and_is_surfaced() {
    let h = harness().await;
    let group = h.group(&["Alice", "Bob"]).await;
    h.queue.fail_next_publishes(3);

    let result = h
        .ledger
        .add_expense(&group.id, new_expense("Taxi", dec!(40), "Bob", &["Alice", "Bob"]))
        .await;

    let stored = h.ledger.get_expenses(&group.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    match result {
        Err(LedgerError::PublishFailure { group_id, expense_id, .. }) => {
            assert_eq!(group_id, group.id);
            assert_eq!(expense_id, stored[0].id);
        }
        other => panic!("expected publish failure, got {:?}", other),
    }
    assert!(
        LedgerError::PublishFailure {
            group_id: group.id.clone(),
            expense_id: stored[0].id.clone(),
            reason: String::new()
        }
        .is_retryable()
    );
    assert_eq!(h.queue.ready_count(QUEUE).await, 0);
    assert_eq!(h.logging.logs_for(RECALCULATION_PUBLISH_FAILED).await.len(), 1);
}

#[tokio::test]
async fn test_publish_is_retried_before_failing() {
    let h = harness().await;
    let group = h.group(&["Alice", "Bob"]).await;
    h.queue.fail_next_publishes(2);

    let result = h
        .ledger
        .add_expense(&group.id, new_expense("Taxi", dec!(40), "Bob", &["Alice", "Bob"]))
        .await;

    assert!(result.is_ok());
    assert_eq!(h.queue.ready_count(QUEUE).await, 1);
}

#[tokio::test]
async fn test_request_recalculation_recovers_lost_trigger() {
    let mut h = harness().await;
    let group = h.group(&["Alice", "Bob"]).await;
    h.queue.fail_next_publishes(3);
    let _ = h
        .ledger
        .add_expense(&group.id, new_expense("Taxi", dec!(40), "Bob", &["Alice", "Bob"]))
        .await;
    assert!(h.balances.get_balances(&group.id).await.unwrap().is_empty());

    let request = h.ledger.request_recalculation(&group.id).await.unwrap().unwrap();
    let stored = h.ledger.get_expenses(&group.id).await.unwrap();
    assert_eq!(
        request,
        RecalculationRequest {
            group_id: group.id.clone(),
            expense_id: stored[0].id.clone(),
            amount: Some(40.0),
        }
    );

    assert_eq!(h.process_next().await, ProcessOutcome::Ack);
    let balances = h.balances.get_balances(&group.id).await.unwrap();
    assert_eq!(balances["Alice"], dec!(-20));
    assert_eq!(balances["Bob"], dec!(20));
}

#[tokio::test]
async fn test_request_recalculation_without_expenses() {
    let h = harness().await;
    let group = h.group(&["Alice"]).await;

    let request = h.ledger.request_recalculation(&group.id).await.unwrap();

    assert!(request.is_none());
    assert_eq!(h.queue.ready_count(QUEUE).await, 0);
}
