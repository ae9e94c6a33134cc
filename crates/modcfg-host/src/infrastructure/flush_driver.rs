//! Tokio task that drives the registry's periodic flush.
//!
//! The registry only knows *whether* a flush is due (`flush_due(now)`); this
//! driver supplies the clock.  It arms the schedule when it starts (the
//! moment the host's timer facility becomes available), then polls every
//! `tick` until the shared `running` flag is cleared, at which point it runs
//! the exit flush and returns.
//!
//! # Shared state
//!
//! The registry lives behind `Arc<tokio::sync::Mutex<_>>` so the driver and
//! the host (edits, loads) can both reach it.  The lock is held only for one
//! poll or one flush at a time.
//!
//! # Clock
//!
//! Time is read through `tokio::time::Instant`, so tests running on a paused
//! runtime (`#[tokio::test(start_paused = true)]`) control the schedule.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::application::registry::{ConfigRegistry, FlushReport};

/// Polls the flush schedule every `tick` until `running` is cleared, then
/// flushes once more and returns the totals of that exit flush.
pub async fn run_flush_driver(
    registry: Arc<Mutex<ConfigRegistry>>,
    tick: Duration,
    running: Arc<AtomicBool>,
) -> FlushReport {
    registry
        .lock()
        .await
        .on_timer_available(Instant::now().into_std());

    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let now = Instant::now().into_std();
        if let Some(report) = registry.lock().await.flush_due(now) {
            if report.attempted() > 0 {
                debug!(saved = report.saved, failed = report.failed, "periodic flush");
            }
        }
    }

    info!("flushing configurations before exit");
    registry.lock().await.on_exit()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockConfigStore, MockModLoader};
    use modcfg_core::{ConfigId, PropertySchema, SchemaClass, SectionSchema};
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    fn registry_counting_writes(writes: Arc<AtomicUsize>) -> Arc<Mutex<ConfigRegistry>> {
        let mut store = MockConfigStore::new();
        store.expect_write().returning(move |id, _| {
            writes.fetch_add(1, Ordering::SeqCst);
            Ok(PathBuf::from("configs").join(id.relative_file_path()))
        });
        let mut loader = MockModLoader::new();
        loader.expect_is_mod_loaded().returning(|_| false);
        loader.expect_mod_version().returning(|_| None);

        let mut registry =
            ConfigRegistry::new(Box::new(store), Arc::new(loader), Duration::from_secs(10));
        registry.register_mod_configuration(
            ConfigId::for_mod("Foo"),
            Arc::new(SchemaClass::new(
                "FooConfig",
                1,
                SectionSchema::new().property("volume", PropertySchema::float(1.0)),
            )),
        );
        Arc::new(Mutex::new(registry))
    }

    #[tokio::test(start_paused = true)]
    async fn test_dirty_config_is_written_after_one_period() {
        // Arrange
        let writes = Arc::new(AtomicUsize::new(0));
        let registry = registry_counting_writes(Arc::clone(&writes));
        let running = Arc::new(AtomicBool::new(true));
        registry
            .lock()
            .await
            .mark_configuration_dirty(&ConfigId::for_mod("Foo"))
            .unwrap();

        // Act
        let driver = tokio::spawn(run_flush_driver(
            Arc::clone(&registry),
            Duration::from_millis(250),
            Arc::clone(&running),
        ));
        tokio::time::sleep(Duration::from_secs(9)).await;
        let before_period = writes.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(2)).await;
        let after_period = writes.load(Ordering::SeqCst);

        running.store(false, Ordering::Relaxed);
        let exit_report = driver.await.unwrap();

        // Assert
        assert_eq!(before_period, 0);
        assert_eq!(after_period, 1);
        assert_eq!(exit_report.attempted(), 0, "nothing left to flush on exit");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_flushes_pending_saves() {
        let writes = Arc::new(AtomicUsize::new(0));
        let registry = registry_counting_writes(Arc::clone(&writes));
        let running = Arc::new(AtomicBool::new(true));

        let driver = tokio::spawn(run_flush_driver(
            Arc::clone(&registry),
            Duration::from_millis(250),
            Arc::clone(&running),
        ));
        tokio::time::sleep(Duration::from_secs(1)).await;
        registry
            .lock()
            .await
            .mark_configuration_dirty(&ConfigId::for_mod("Foo"))
            .unwrap();
        running.store(false, Ordering::Relaxed);
        let exit_report = driver.await.unwrap();

        assert_eq!(exit_report.saved, 1);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_driver_writes_nothing() {
        let writes = Arc::new(AtomicUsize::new(0));
        let registry = registry_counting_writes(Arc::clone(&writes));
        let running = Arc::new(AtomicBool::new(true));

        let driver = tokio::spawn(run_flush_driver(
            registry,
            Duration::from_millis(250),
            Arc::clone(&running),
        ));
        tokio::time::sleep(Duration::from_secs(35)).await;
        running.store(false, Ordering::Relaxed);
        driver.await.unwrap();

        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }
}
