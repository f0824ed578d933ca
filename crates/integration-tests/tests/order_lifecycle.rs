//! End-to-end order lifecycle tests.

use dokan_bot::error::AppError;
use dokan_bot::services::orders::ProofOutcome;
use dokan_bot::services::sessions::AdminSession;
use dokan_core::{Category, OrderStatus, UserId};

use dokan_integration_tests::{ADMIN_ONE, ADMIN_TWO, SUPPORT_URL, TestContext};

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_vpn_purchase_through_delivery() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(7).await;
    let item = ctx
        .seed_item(Category::Vpn, "VPN 30 days / 50 GB", 129_000, true)
        .await;

    // Selection creates the order with a price snapshot.
    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    assert_eq!(order.status, OrderStatus::AwaitingPayment);
    assert_eq!(order.price.amount(), 129_000);
    assert_eq!(order.item_title, "VPN 30 days / 50 GB");

    // Proof upload moves the order forward and notifies every admin.
    let outcome = ctx
        .orders
        .attach_proof(&buyer, TestContext::photo_proof())
        .await
        .unwrap();
    assert!(matches!(outcome, ProofOutcome::Attached(_)));
    assert_eq!(ctx.order_status(order.id).await, OrderStatus::ProofSubmitted);
    assert_eq!(ctx.channel.proof_recipients(), vec![ADMIN_ONE, ADMIN_TWO]);

    // Approval notifies the buyer and opens a delivery-capture session.
    let approved = ctx.orders.approve(order.id, ADMIN_ONE).await.unwrap();
    assert_eq!(approved.status, OrderStatus::Approved);
    assert_eq!(approved.decided_by, Some(ADMIN_ONE));
    let buyer_texts = ctx.channel.texts_to(buyer.id);
    assert!(buyer_texts.iter().any(|t| t.contains("approved")));
    assert!(buyer_texts.iter().any(|t| t.contains(order.code.as_str())));
    assert_eq!(
        ctx.sessions.get(ADMIN_ONE),
        Some(AdminSession::AwaitingDelivery { order_id: order.id })
    );

    // The admin's next message is the delivery content, copied to the buyer.
    ctx.sessions.take(ADMIN_ONE);
    let delivery = TestContext::draft_from(ADMIN_ONE, 555);
    let delivered = ctx
        .orders
        .finalize_delivery(order.id, ADMIN_ONE, &delivery)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(
        delivered
            .delivery_note
            .as_deref()
            .unwrap()
            .contains("delivered_by_admin:900")
    );
    assert_eq!(ctx.channel.copies_to(buyer.id), vec![delivery]);
}

#[tokio::test]
async fn test_reject_flow_stores_reason_verbatim() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(8).await;
    let item = ctx
        .seed_item(Category::App, "Spotify 1 month", 120_000, true)
        .await;

    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    ctx.orders
        .attach_proof(&buyer, TestContext::photo_proof())
        .await
        .unwrap();

    let rejected = ctx.orders.reject(order.id, ADMIN_TWO).await.unwrap();
    assert_eq!(rejected.status, OrderStatus::Rejected);
    assert_eq!(
        ctx.sessions.get(ADMIN_TWO),
        Some(AdminSession::AwaitingRejectReason { order_id: order.id })
    );

    ctx.sessions.take(ADMIN_TWO);
    let with_reason = ctx
        .orders
        .record_rejection_reason(order.id, "out of stock")
        .await
        .unwrap();
    assert_eq!(with_reason.rejection_reason.as_deref(), Some("out of stock"));

    // Buyer sees the reason and the support contact.
    let texts = ctx.channel.texts_to(buyer.id);
    let notice = texts.last().unwrap();
    assert!(notice.contains("out of stock"));
    assert!(notice.contains(SUPPORT_URL));
}

// =============================================================================
// Tolerated edge: decision before proof
// =============================================================================

#[tokio::test]
async fn test_approve_from_awaiting_payment_is_accepted() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(9).await;
    let item = ctx.seed_item(Category::Vpn, "VPN trial", 0, true).await;

    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    // No proof attached; the admin decides from partial context.
    let approved = ctx.orders.approve(order.id, ADMIN_ONE).await.unwrap();
    assert_eq!(approved.status, OrderStatus::Approved);
}

#[tokio::test]
async fn test_reject_from_awaiting_payment_is_accepted() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(10).await;
    let item = ctx.seed_item(Category::Vpn, "VPN trial", 0, true).await;

    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    let rejected = ctx.orders.reject(order.id, ADMIN_ONE).await.unwrap();
    assert_eq!(rejected.status, OrderStatus::Rejected);
}

// =============================================================================
// Terminal states and invalid transitions
// =============================================================================

#[tokio::test]
async fn test_double_approve_is_invalid_and_does_not_renotify() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(11).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 185_000, true).await;

    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    ctx.orders
        .attach_proof(&buyer, TestContext::photo_proof())
        .await
        .unwrap();
    ctx.orders.approve(order.id, ADMIN_ONE).await.unwrap();

    let notifications_before = ctx.channel.texts_to(buyer.id).len();
    let err = ctx.orders.approve(order.id, ADMIN_TWO).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    assert_eq!(ctx.channel.texts_to(buyer.id).len(), notifications_before);
    assert_eq!(ctx.order_status(order.id).await, OrderStatus::Approved);
}

#[tokio::test]
async fn test_terminal_states_accept_no_transition() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(12).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 220_000, true).await;

    // Drive one order to delivered.
    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    ctx.orders
        .attach_proof(&buyer, TestContext::photo_proof())
        .await
        .unwrap();
    ctx.orders.approve(order.id, ADMIN_ONE).await.unwrap();
    ctx.orders
        .finalize_delivery(order.id, ADMIN_ONE, &TestContext::draft_from(ADMIN_ONE, 1))
        .await
        .unwrap();

    assert!(matches!(
        ctx.orders.approve(order.id, ADMIN_ONE).await.unwrap_err(),
        AppError::InvalidTransition { .. }
    ));
    assert!(matches!(
        ctx.orders.reject(order.id, ADMIN_ONE).await.unwrap_err(),
        AppError::InvalidTransition { .. }
    ));
    assert!(matches!(
        ctx.orders
            .finalize_delivery(order.id, ADMIN_ONE, &TestContext::draft_from(ADMIN_ONE, 2))
            .await
            .unwrap_err(),
        AppError::InvalidTransition { .. }
    ));

    // And a rejected order refuses delivery outright.
    let order2 = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    ctx.orders.reject(order2.id, ADMIN_ONE).await.unwrap();
    assert!(matches!(
        ctx.orders
            .finalize_delivery(order2.id, ADMIN_ONE, &TestContext::draft_from(ADMIN_ONE, 3))
            .await
            .unwrap_err(),
        AppError::InvalidTransition { .. }
    ));
}

#[tokio::test]
async fn test_delivery_requires_approved_state() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(13).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 340_000, true).await;

    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    let err = ctx
        .orders
        .finalize_delivery(order.id, ADMIN_ONE, &TestContext::draft_from(ADMIN_ONE, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    // No content reached the buyer.
    assert!(ctx.channel.copies_to(buyer.id).is_empty());
}

#[tokio::test]
async fn test_rejection_reason_requires_rejected_state() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(14).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 420_000, true).await;

    let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
    let err = ctx
        .orders
        .record_rejection_reason(order.id, "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

// =============================================================================
// Creation constraints
// =============================================================================

#[tokio::test]
async fn test_inactive_item_is_unavailable() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(15).await;
    let item = ctx
        .seed_item(Category::App, "Discontinued plan", 99_000, false)
        .await;

    let err = ctx.orders.create_order(buyer.id, &item).await.unwrap_err();
    assert!(matches!(err, AppError::ItemUnavailable));
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let ctx = TestContext::new().await;
    ctx.seed_user(16).await;

    let err = ctx
        .orders
        .approve(dokan_core::OrderId::new(424_242), UserId::new(900))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OrderNotFound(_)));
}
