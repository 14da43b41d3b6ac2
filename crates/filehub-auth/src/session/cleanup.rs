//! Background purge of expired sessions.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

use super::store::SessionStore;

/// Starts the reaper loop.
///
/// The task holds only a weak reference and exits once the store is
/// dropped; otherwise it lives as long as the runtime.
pub fn spawn_reaper(store: Weak<SessionStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            let Some(store) = store.upgrade() else {
                debug!("Session store dropped, stopping reaper");
                break;
            };
            let removed = store.reap().await;
            if removed > 0 {
                info!(count = removed, "Reaped expired sessions");
            }
        }
    })
}
