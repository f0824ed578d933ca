//! Broadcast engine.
//!
//! Delivers a copy of an admin's draft to every recipient in a segment,
//! sequentially and with explicit pacing. The constraint is the platform's
//! per-sender rate ceiling, not local compute, so recipients are never
//! processed in parallel; the run blocks the invoking admin action until it
//! completes and cannot be cancelled once started.
//!
//! No per-recipient failure ever aborts the run. Failures are classified:
//! permanently unreachable recipients (blocked/deactivated) get their
//! `blocked` flag set and broadcast opt-in revoked so future runs skip them;
//! rate limits trigger a single shared backoff; anything else counts as
//! failed with a gentle pause. One audit row is written after the loop.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use dokan_core::{Segment, UserId};

use crate::db::Database;
use crate::error::AppError;
use crate::models::draft::Draft;
use crate::telegram::{Channel, DeliveryFailure};

/// Sleep abstraction so pacing is testable without real delays.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Pacing and backoff knobs for a broadcast run.
#[derive(Debug, Clone)]
pub struct BroadcastPolicy {
    /// Delay after every successful send.
    pub pace: Duration,
    /// Delay after an unclassified failure.
    pub failure_pause: Duration,
    /// Backoff when the server suggests no retry delay.
    pub rate_limit_fallback: Duration,
    /// Safety margin added on top of the suggested (or fallback) delay.
    pub rate_limit_margin: Duration,
    /// Recipients per batch.
    pub batch_size: usize,
    /// Pause after each full batch.
    pub batch_pause: Duration,
}

impl Default for BroadcastPolicy {
    fn default() -> Self {
        Self {
            pace: Duration::from_millis(30),
            failure_pause: Duration::from_millis(50),
            rate_limit_fallback: Duration::from_secs(1),
            rate_limit_margin: Duration::from_secs(1),
            batch_size: 50,
            batch_pause: Duration::from_millis(500),
        }
    }
}

impl BroadcastPolicy {
    /// How long to back off for a rate-limited send.
    #[must_use]
    pub fn rate_limit_delay(&self, suggested: Option<Duration>) -> Duration {
        suggested.unwrap_or(self.rate_limit_fallback) + self.rate_limit_margin
    }
}

/// Aggregate result of a broadcast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub sent_ok: u32,
    pub sent_fail: u32,
}

/// The broadcast engine.
pub struct Broadcaster<C, S> {
    db: Database,
    channel: C,
    sleeper: S,
    policy: BroadcastPolicy,
}

impl<C: Channel, S: Sleeper> Broadcaster<C, S> {
    /// Create a new broadcast engine.
    #[must_use]
    pub fn new(db: Database, channel: C, sleeper: S, policy: BroadcastPolicy) -> Self {
        Self {
            db,
            channel,
            sleeper,
            policy,
        }
    }

    /// Deliver `draft` to every recipient, then write the audit row.
    ///
    /// Recipients arrive already resolved (segment filtering happens in the
    /// user directory); the segment is recorded for the audit trail.
    /// `sent_ok + sent_fail` always equals the recipient count.
    ///
    /// # Errors
    ///
    /// Per-recipient failures never surface; only the final audit write can
    /// fail.
    #[instrument(skip(self, draft, recipients), fields(admin = %admin, segment = %segment, recipients = recipients.len()))]
    pub async fn run(
        &self,
        admin: UserId,
        draft: &Draft,
        segment: Segment,
        recipients: &[UserId],
    ) -> Result<BroadcastOutcome, AppError> {
        let mut sent_ok: u32 = 0;
        let mut sent_fail: u32 = 0;

        for (processed, &recipient) in recipients.iter().enumerate() {
            match self.channel.copy_draft(recipient, draft).await {
                Ok(()) => {
                    sent_ok += 1;
                    self.sleeper.sleep(self.policy.pace).await;
                }
                Err(e) => {
                    sent_fail += 1;
                    match e.delivery_failure() {
                        DeliveryFailure::Blocked => {
                            self.mark_unreachable(recipient).await;
                        }
                        DeliveryFailure::RateLimited(suggested) => {
                            let delay = self.policy.rate_limit_delay(suggested);
                            warn!(recipient = %recipient, delay_ms = delay.as_millis() as u64, "Rate limited, backing off");
                            self.sleeper.sleep(delay).await;
                        }
                        DeliveryFailure::Other => {
                            warn!(recipient = %recipient, error = %e, "Broadcast delivery failed");
                            self.sleeper.sleep(self.policy.failure_pause).await;
                        }
                    }
                }
            }

            if (processed + 1) % self.policy.batch_size == 0 {
                self.sleeper.sleep(self.policy.batch_pause).await;
            }
        }

        self.db
            .broadcasts()
            .record_run(admin, draft, segment, sent_ok, sent_fail, Utc::now())
            .await?;

        info!(sent_ok, sent_fail, "Broadcast run complete");
        Ok(BroadcastOutcome { sent_ok, sent_fail })
    }

    /// Flag a permanently unreachable recipient so future segment resolution
    /// skips them. Persistence failures here must not abort the run.
    async fn mark_unreachable(&self, recipient: UserId) {
        info!(recipient = %recipient, "Recipient unreachable, revoking broadcast opt-in");
        if let Err(e) = self.db.users().set_blocked(recipient, true).await {
            warn!(recipient = %recipient, error = %e, "Failed to set blocked flag");
        }
        if let Err(e) = self.db.users().set_opt_in(recipient, false).await {
            warn!(recipient = %recipient, error = %e, "Failed to revoke opt-in");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = BroadcastPolicy::default();
        assert_eq!(policy.pace, Duration::from_millis(30));
        assert_eq!(policy.failure_pause, Duration::from_millis(50));
        assert_eq!(policy.batch_size, 50);
        assert_eq!(policy.batch_pause, Duration::from_millis(500));
    }

    #[test]
    fn test_rate_limit_delay_prefers_server_hint() {
        let policy = BroadcastPolicy::default();
        assert_eq!(
            policy.rate_limit_delay(Some(Duration::from_secs(7))),
            Duration::from_secs(8)
        );
        assert_eq!(policy.rate_limit_delay(None), Duration::from_secs(2));
    }
}
