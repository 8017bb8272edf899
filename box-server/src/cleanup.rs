//! Background cleanup task for idle rooms.
//!
//! Runs periodically to remove rooms nobody has touched for
//! `cleanup.idle_room_secs`, and to evict stale rate limiter entries.

use crate::config::CleanupConfig;
use crate::server::Coordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Spawn a background cleanup task.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_task(
    coordinator: Arc<Coordinator>,
    config: CleanupConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Cleanup task disabled");
            return;
        }

        let interval_secs = config.interval_secs.max(1);
        let max_idle = Duration::from_secs(config.idle_room_secs);
        tracing::info!(
            "Cleanup task started (interval: {}s, idle limit: {}s)",
            interval_secs,
            config.idle_room_secs
        );

        let mut timer = interval(Duration::from_secs(interval_secs));

        loop {
            timer.tick().await;
            run_once(&coordinator, max_idle);
        }
    })
}

/// One cleanup pass. Returns the number of rooms removed.
pub fn run_once(coordinator: &Coordinator, max_idle: Duration) -> usize {
    let removed = coordinator.remove_idle_rooms(max_idle);
    coordinator.rate_limits().shrink();
    if removed > 0 {
        tracing::info!("Cleanup: removed {} idle rooms", removed);
    } else {
        tracing::debug!("Cleanup: no idle rooms");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use box_types::RoomId;

    #[tokio::test]
    async fn cleanup_pass_removes_idle_rooms() {
        let coordinator = Coordinator::new(Config::default());
        coordinator
            .join(1, Some(RoomId::parse("stale").unwrap()), None)
            .await
            .unwrap();

        assert_eq!(run_once(&coordinator, Duration::from_secs(60)), 0);
        assert_eq!(run_once(&coordinator, Duration::ZERO), 1);
        assert_eq!(coordinator.total_rooms(), 0);
    }

    #[tokio::test]
    async fn cleanup_task_disabled() {
        let coordinator = Arc::new(Coordinator::new(Config::default()));
        let config = CleanupConfig {
            enabled: false,
            interval_secs: 1,
            idle_room_secs: 1,
        };

        let handle = spawn_cleanup_task(coordinator, config);

        // Task should complete immediately when disabled
        tokio::time::timeout(Duration::from_millis(100), handle)
            .await
            .expect("Task should complete when disabled")
            .expect("Task should not panic");
    }

    #[tokio::test]
    async fn cleanup_task_runs_on_interval() {
        let coordinator = Arc::new(Coordinator::new(Config::default()));
        coordinator
            .join(1, Some(RoomId::parse("idle").unwrap()), None)
            .await
            .unwrap();
        let config = CleanupConfig {
            enabled: true,
            interval_secs: 1,
            idle_room_secs: 0,
        };

        // The first tick fires immediately.
        let handle = spawn_cleanup_task(coordinator.clone(), config);
        for _ in 0..50 {
            if coordinator.total_rooms() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert_eq!(coordinator.total_rooms(), 0);
    }
}
