//! Remediation Worker
//!
//! Background task that drains the remediation queue. It holds only a weak
//! reference to the engine, so dropping every other handle stops the loop.

use std::sync::{Arc, Weak};
use std::time::Duration;

use super::engine::RemediationEngine;

/// Spawn the queue-draining loop. Poll cadence comes from
/// `PipelineConfig::queue_poll_interval_ms`.
pub fn spawn_worker(engine: &Arc<RemediationEngine>) -> tokio::task::JoinHandle<()> {
    let interval_ms = engine.poll_interval_ms();
    let weak: Weak<RemediationEngine> = Arc::downgrade(engine);

    tokio::spawn(async move {
        log::info!("remediation worker started ({}ms poll)", interval_ms);
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match weak.upgrade() {
                Some(engine) => engine.tick().await,
                None => break,
            }
        }
        log::info!("remediation worker stopped");
    })
}
