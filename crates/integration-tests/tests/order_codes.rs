//! Order code uniqueness and collision handling.

use std::collections::HashSet;

use dokan_core::{Category, OrderCode};

use dokan_integration_tests::TestContext;

#[tokio::test]
async fn test_many_orders_get_distinct_codes() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(20).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 129_000, true).await;

    let mut codes = HashSet::new();
    for _ in 0..30 {
        let order = ctx.orders.create_order(buyer.id, &item).await.unwrap();
        let code = order.code.to_string();
        assert!(code.starts_with("ORD-"), "unexpected code format: {code}");
        assert_eq!(code.len(), "ORD-YYYYMMDD-XXXX".len());
        codes.insert(code);
    }
    assert_eq!(codes.len(), 30);
}

#[tokio::test]
async fn test_code_collision_triggers_exactly_one_regeneration() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(21).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 185_000, true).await;

    // Occupy a known code.
    let taken = || OrderCode::from_stored("ORD-20250101-AAAA".to_owned());
    let first = ctx
        .orders
        .create_order_with(buyer.id, &item, taken)
        .await
        .unwrap();
    assert_eq!(first.code.as_str(), "ORD-20250101-AAAA");

    // Second creation draws the taken code first, then a fresh one.
    let mut drawn = 0_u32;
    let order = ctx
        .orders
        .create_order_with(buyer.id, &item, || {
            drawn += 1;
            if drawn == 1 {
                OrderCode::from_stored("ORD-20250101-AAAA".to_owned())
            } else {
                OrderCode::from_stored("ORD-20250101-BBBB".to_owned())
            }
        })
        .await
        .unwrap();

    assert_eq!(drawn, 2, "collision should cost exactly one extra draw");
    assert_eq!(order.code.as_str(), "ORD-20250101-BBBB");
}

#[tokio::test]
async fn test_exhausted_code_source_surfaces_conflict() {
    let ctx = TestContext::new().await;
    let buyer = ctx.seed_user(22).await;
    let item = ctx.seed_item(Category::Vpn, "VPN plan", 220_000, true).await;

    let stuck = || OrderCode::from_stored("ORD-20250101-CCCC".to_owned());
    ctx.orders
        .create_order_with(buyer.id, &item, stuck)
        .await
        .unwrap();

    // Every retry draws the same occupied code.
    let err = ctx
        .orders
        .create_order_with(buyer.id, &item, stuck)
        .await
        .unwrap_err();
    assert!(matches!(err, dokan_bot::error::AppError::Database(_)));
}
