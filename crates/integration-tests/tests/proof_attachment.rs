//! Proof attachment binding rules.

use dokan_bot::services::orders::ProofOutcome;
use dokan_core::{Category, OrderStatus};

use dokan_integration_tests::TestContext;

#[tokio::test]
async fn test_proof_without_open_order_is_a_noop() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user(30).await;

    let outcome = ctx
        .orders
        .attach_proof(&user, TestContext::photo_proof())
        .await
        .unwrap();

    assert!(matches!(outcome, ProofOutcome::NoOpenOrder));
    // No admin notification, no reply, nothing.
    assert!(ctx.channel.outbox().is_empty());
}

#[tokio::test]
async fn test_proof_ignored_once_order_left_awaiting_payment() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user(31).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 129_000, true).await;

    let order = ctx.orders.create_order(user.id, &item).await.unwrap();
    ctx.orders
        .attach_proof(&user, TestContext::photo_proof())
        .await
        .unwrap();
    let notified = ctx.channel.proof_recipients().len();

    // A second upload finds no awaiting_payment order.
    let outcome = ctx
        .orders
        .attach_proof(&user, TestContext::photo_proof())
        .await
        .unwrap();
    assert!(matches!(outcome, ProofOutcome::NoOpenOrder));
    assert_eq!(ctx.channel.proof_recipients().len(), notified);
    assert_eq!(ctx.order_status(order.id).await, OrderStatus::ProofSubmitted);
}

#[tokio::test]
async fn test_proof_binds_to_most_recent_open_order() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user(32).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 185_000, true).await;

    let older = ctx.orders.create_order(user.id, &item).await.unwrap();
    let newer = ctx.orders.create_order(user.id, &item).await.unwrap();

    let outcome = ctx
        .orders
        .attach_proof(&user, TestContext::photo_proof())
        .await
        .unwrap();

    let ProofOutcome::Attached(attached) = outcome else {
        panic!("proof should attach");
    };
    assert_eq!(attached.id, newer.id);
    assert_eq!(ctx.order_status(newer.id).await, OrderStatus::ProofSubmitted);
    assert_eq!(
        ctx.order_status(older.id).await,
        OrderStatus::AwaitingPayment
    );
}

#[tokio::test]
async fn test_attached_proof_is_stored_on_the_order() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user(33).await;
    let item = ctx.seed_item(Category::App, "Spotify 1 month", 120_000, true).await;

    let order = ctx.orders.create_order(user.id, &item).await.unwrap();
    ctx.orders
        .attach_proof(&user, TestContext::photo_proof())
        .await
        .unwrap();

    let stored = ctx.db.orders().get(order.id).await.unwrap().unwrap();
    let proof = stored.proof.expect("proof stored");
    assert_eq!(proof.file_id, "photo-file-1");
    assert_eq!(proof.kind, dokan_core::ProofKind::Photo);
}
