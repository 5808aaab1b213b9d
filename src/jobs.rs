use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::services::tier;
use crate::state::AppState;

/// Spawn the periodic tier reconciliation sweep.
///
/// The first tick fires immediately, so a freshly started server converges
/// stale tiers without waiting a full day.
pub fn spawn_tier_reconciliation(state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.tier_job_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            run_sweep(&state);
        }
    });
}

fn run_sweep(state: &AppState) {
    // A sweep that outlives the interval must not stack a second one on top.
    if state
        .tier_job_running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        tracing::warn!("tier reconciliation still running, skipping this tick");
        return;
    }

    let result = {
        let db = state.db.lock().unwrap();
        tier::reconcile_all(&db)
    };

    match result {
        Ok(summary) => tracing::info!(
            "tier reconciliation swept {} clients ({} updated, {} already current)",
            summary.scanned,
            summary.updated,
            summary.skipped
        ),
        Err(err) => tracing::error!("tier reconciliation failed: {err}"),
    }

    state.tier_job_running.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::config::AppConfig;
    use crate::db;
    use crate::services::notification::{BookingNotice, Notifier};

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn send_booking_confirmation(&self, _notice: &BookingNotice) -> anyhow::Result<()> {
            Ok(())
        }

        async fn send_booking_rejection(&self, _notice: &BookingNotice) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn test_state() -> AppState {
        let conn = db::init_db(":memory:").unwrap();
        AppState {
            db: Arc::new(Mutex::new(conn)),
            config: AppConfig::from_env(),
            notifier: Box::new(SilentNotifier),
            tier_job_running: AtomicBool::new(false),
        }
    }

    #[test]
    fn sweep_clears_the_running_flag() {
        let state = test_state();
        run_sweep(&state);
        assert!(!state.tier_job_running.load(Ordering::SeqCst));
    }

    #[test]
    fn overlapping_sweep_is_skipped() {
        let state = test_state();
        state.tier_job_running.store(true, Ordering::SeqCst);
        run_sweep(&state);
        // The guard was held by someone else, so the skipped tick leaves it alone.
        assert!(state.tier_job_running.load(Ordering::SeqCst));
    }
}
