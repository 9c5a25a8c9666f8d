//! Broadcast engine — the polling loop that sends the promo message.
//!
//! One cycle walks the eligible roster in membership order and sends to
//! every group outside its cooldown, pausing between attempts. Errors are
//! best-effort: a failed group is logged and the loop moves on, with three
//! structured exceptions (kicked, migrated, flood-limited) that adjust the
//! roster or cooldown state instead.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use groupcast_core::config::{GroupcastConfig, TimingConfig};
use groupcast_core::error::Result;
use groupcast_core::traits::Messenger;

use crate::cooldown::CooldownTracker;
use crate::roster::SharedRoster;

/// What one cycle did, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Messages delivered (or planned, in dry-run mode).
    pub sent: usize,
    /// Groups still inside their cooldown or deferral window.
    pub skipped: usize,
    /// Groups pushed back by server flood control this cycle.
    pub deferred: usize,
    /// Groups that followed a supergroup migration to a new chat id.
    pub migrated: usize,
    /// Groups dropped because the platform says we cannot message them.
    pub removed: usize,
    /// Sends that failed for any other reason.
    pub failed: usize,
}

impl CycleReport {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sent, {} skipped, {} deferred, {} migrated, {} removed, {} failed",
            self.sent, self.skipped, self.deferred, self.migrated, self.removed, self.failed
        )
    }
}

/// The broadcast engine. Generic over the messenger so tests can run full
/// cycles against a scripted mock.
pub struct BroadcastEngine<M: Messenger> {
    messenger: M,
    roster: SharedRoster,
    tracker: CooldownTracker,
    message: String,
    timing: TimingConfig,
    exclude: HashSet<i64>,
    max_groups: usize,
    dry_run: bool,
}

impl<M: Messenger> BroadcastEngine<M> {
    pub fn new(messenger: M, roster: SharedRoster, config: &GroupcastConfig) -> Self {
        Self {
            messenger,
            roster,
            tracker: CooldownTracker::new(chrono::Duration::seconds(
                config.timing.cooldown_secs as i64,
            )),
            message: config.message.clone(),
            timing: config.timing.clone(),
            exclude: config.roster.exclude.iter().copied().collect(),
            max_groups: config.roster.max_groups,
            dry_run: false,
        }
    }

    /// Plan and log cycles without sending anything.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run cycles forever, one every `check_interval`, until the shutdown
    /// flag flips. The flag is also observed between per-group sends and
    /// inside every sleep.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "📣 broadcast loop started (cycle every {}s, cooldown {}s)",
            self.timing.check_interval_secs,
            self.timing.cooldown_secs
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.cycle(&mut shutdown).await {
                Ok(report) => {
                    if report.is_idle() {
                        tracing::debug!("cycle idle ({} group(s) in roster)", self.roster.len().await);
                    } else {
                        tracing::info!("📤 cycle done: {report}");
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ cycle failed: {e}");
                    if sleep_interruptible(
                        Duration::from_secs(self.timing.error_backoff_secs),
                        &mut shutdown,
                    )
                    .await
                    {
                        break;
                    }
                }
            }

            if sleep_interruptible(
                Duration::from_secs(self.timing.check_interval_secs),
                &mut shutdown,
            )
            .await
            {
                break;
            }
        }

        tracing::info!("📪 broadcast loop stopped");
    }

    /// Run exactly one cycle (`--once`, tests).
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let (_tx, mut never) = watch::channel(false);
        self.cycle(&mut never).await
    }

    async fn cycle(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<CycleReport> {
        let targets = self.roster.eligible(&self.exclude, self.max_groups).await;
        let mut report = CycleReport::default();

        for group in targets {
            if *shutdown.borrow() {
                break;
            }

            let now = Utc::now();
            if !self.tracker.ready(group.id, now) {
                if let Some(left) = self.tracker.remaining(group.id, now) {
                    tracing::debug!("⏲ {} not due for another {}s", group.label(), left.num_seconds());
                }
                report.skipped += 1;
                continue;
            }

            if self.dry_run {
                tracing::info!("📝 [dry-run] would send to {}", group.label());
                report.sent += 1;
                continue;
            }

            match self.messenger.send_text(group.id, &self.message).await {
                Ok(_) => {
                    self.tracker.mark_sent(group.id, Utc::now());
                    report.sent += 1;
                    tracing::info!("✅ sent to {}", group.label());
                }
                Err(e) => {
                    if e.is_gone() {
                        self.roster.remove(group.id).await?;
                        self.tracker.forget(group.id);
                        report.removed += 1;
                        tracing::info!("🚪 dropping {}: {e}", group.label());
                    } else if let Some(new_id) = e.migrated_to() {
                        self.roster.rekey(group.id, new_id).await?;
                        self.tracker.rekey(group.id, new_id);
                        report.migrated += 1;
                        tracing::info!("🔀 {} migrated to {new_id}", group.label());
                    } else if let Some(secs) = e.retry_after() {
                        // Expected flood-control noise, not an error.
                        self.tracker
                            .defer_until(group.id, Utc::now() + chrono::Duration::seconds(secs as i64));
                        report.deferred += 1;
                        tracing::info!("⏳ flood control on {}: waiting {secs}s", group.label());
                    } else {
                        report.failed += 1;
                        tracing::warn!("⚠️ send to {} failed: {e}", group.label());
                    }
                }
            }

            // Pause after every attempt, successful or not. Cooldown skips
            // above bypass this, so quiet cycles finish fast.
            if sleep_interruptible(
                Duration::from_secs(self.timing.inter_send_delay_secs),
                shutdown,
            )
            .await
            {
                break;
            }
        }

        Ok(report)
    }
}

/// Sleep unless the shutdown flag flips first. Returns true on shutdown.
async fn sleep_interruptible(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.changed() => true,
    }
}
