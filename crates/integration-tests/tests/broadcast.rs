//! Broadcast engine: counts, failure classification, pacing, audit trail.

use std::time::Duration;

use dokan_core::{Segment, UserId};

use dokan_integration_tests::{ADMIN_ONE, FailureScript, TestContext};

const PACE: Duration = Duration::from_millis(30);
const FAILURE_PAUSE: Duration = Duration::from_millis(50);
const BATCH_PAUSE: Duration = Duration::from_millis(500);

#[tokio::test]
async fn test_blocked_recipients_are_counted_and_flagged() {
    let ctx = TestContext::new().await;
    let recipients: Vec<UserId> = {
        let mut ids = Vec::new();
        for n in 100..106 {
            ids.push(ctx.seed_user(n).await.id);
        }
        ids
    };
    // Two of six recipients have blocked the bot.
    ctx.channel.fail_for(recipients[1], FailureScript::Blocked);
    ctx.channel.fail_for(recipients[4], FailureScript::Blocked);

    let draft = TestContext::draft_from(ADMIN_ONE, 77);
    let outcome = ctx
        .broadcaster
        .run(ADMIN_ONE, &draft, Segment::All, &recipients)
        .await
        .unwrap();

    assert_eq!(outcome.sent_ok, 4);
    assert_eq!(outcome.sent_fail, 2);
    assert_eq!(
        outcome.sent_ok + outcome.sent_fail,
        u32::try_from(recipients.len()).unwrap()
    );

    // Blocked recipients lose opt-in and are marked blocked.
    for (i, &id) in recipients.iter().enumerate() {
        let user = ctx.db.users().get(id).await.unwrap().unwrap();
        let expect_blocked = i == 1 || i == 4;
        assert_eq!(user.blocked, expect_blocked, "user index {i}");
        assert_eq!(user.allow_broadcast, !expect_blocked, "user index {i}");
    }

    // Exactly one audit row, written after the loop.
    let records = ctx.db.broadcasts().list().await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.segment, "all");
    assert_eq!(record.sent_ok, 4);
    assert_eq!(record.sent_fail, 2);
    assert_eq!(record.admin_id, ADMIN_ONE.as_i64());
    assert_eq!(record.message_id, 77);
}

#[tokio::test]
async fn test_rate_limit_honors_server_hint() {
    let ctx = TestContext::new().await;
    let a = ctx.seed_user(110).await.id;
    let b = ctx.seed_user(111).await.id;
    let c = ctx.seed_user(112).await.id;
    ctx.channel
        .fail_for(b, FailureScript::RateLimited(Some(Duration::from_secs(7))));

    let draft = TestContext::draft_from(ADMIN_ONE, 78);
    let outcome = ctx
        .broadcaster
        .run(ADMIN_ONE, &draft, Segment::All, &[a, b, c])
        .await
        .unwrap();

    assert_eq!(outcome.sent_ok, 2);
    assert_eq!(outcome.sent_fail, 1);
    // Pace after each success; suggested 7s + 1s margin for the throttled one.
    assert_eq!(
        ctx.sleeper.sleeps(),
        vec![PACE, Duration::from_secs(8), PACE]
    );
}

#[tokio::test]
async fn test_rate_limit_without_hint_uses_fallback() {
    let ctx = TestContext::new().await;
    let a = ctx.seed_user(113).await.id;
    ctx.channel.fail_for(a, FailureScript::RateLimited(None));

    let draft = TestContext::draft_from(ADMIN_ONE, 79);
    let outcome = ctx
        .broadcaster
        .run(ADMIN_ONE, &draft, Segment::All, &[a])
        .await
        .unwrap();

    assert_eq!(outcome.sent_fail, 1);
    // 1s fallback + 1s margin.
    assert_eq!(ctx.sleeper.sleeps(), vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn test_unknown_failures_get_a_gentle_pause() {
    let ctx = TestContext::new().await;
    let a = ctx.seed_user(114).await.id;
    let b = ctx.seed_user(115).await.id;
    ctx.channel.fail_for(a, FailureScript::Other);

    let draft = TestContext::draft_from(ADMIN_ONE, 80);
    let outcome = ctx
        .broadcaster
        .run(ADMIN_ONE, &draft, Segment::All, &[a, b])
        .await
        .unwrap();

    assert_eq!(outcome.sent_ok, 1);
    assert_eq!(outcome.sent_fail, 1);
    assert_eq!(ctx.sleeper.sleeps(), vec![FAILURE_PAUSE, PACE]);
    // Unknown failures do not flip flags.
    let user = ctx.db.users().get(a).await.unwrap().unwrap();
    assert!(!user.blocked);
    assert!(user.allow_broadcast);
}

#[tokio::test]
async fn test_batch_pause_every_fifty_recipients() {
    let ctx = TestContext::new().await;
    let mut recipients = Vec::new();
    for n in 1000..1120 {
        recipients.push(ctx.seed_user(n).await.id);
    }

    let draft = TestContext::draft_from(ADMIN_ONE, 81);
    let outcome = ctx
        .broadcaster
        .run(ADMIN_ONE, &draft, Segment::All, &recipients)
        .await
        .unwrap();

    assert_eq!(outcome.sent_ok, 120);
    let sleeps = ctx.sleeper.sleeps();
    let paces = sleeps.iter().filter(|d| **d == PACE).count();
    let batch_pauses = sleeps.iter().filter(|d| **d == BATCH_PAUSE).count();
    assert_eq!(paces, 120);
    // After recipients 50 and 100; the run ends before a third batch fills.
    assert_eq!(batch_pauses, 2);
}

#[tokio::test]
async fn test_mixed_failures_never_abort_the_run() {
    let ctx = TestContext::new().await;
    let mut recipients = Vec::new();
    for n in 200..210 {
        recipients.push(ctx.seed_user(n).await.id);
    }
    ctx.channel.fail_for(recipients[0], FailureScript::Blocked);
    ctx.channel
        .fail_for(recipients[3], FailureScript::RateLimited(None));
    ctx.channel.fail_for(recipients[7], FailureScript::Other);

    let draft = TestContext::draft_from(ADMIN_ONE, 82);
    let outcome = ctx
        .broadcaster
        .run(ADMIN_ONE, &draft, Segment::Active30, &recipients)
        .await
        .unwrap();

    assert_eq!(outcome.sent_ok, 7);
    assert_eq!(outcome.sent_fail, 3);

    let records = ctx.db.broadcasts().list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].segment, "active30");
}
