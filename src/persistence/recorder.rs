//! Background task appending bus events to the event log.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::PostgresPersistence;
use crate::domain::PoolEvent;

/// Spawns a task that writes every event received on `event_rx` to the
/// event log. The task ends when the bus closes.
///
/// Write failures are logged and skipped; a lagging recorder logs how many
/// events it lost.
#[must_use]
pub fn spawn_event_recorder(
    persistence: PostgresPersistence,
    mut event_rx: broadcast::Receiver<PoolEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => match persistence.save_event(&event).await {
                    Ok(row_id) => {
                        tracing::trace!(row_id, pool_id = %event.pool_id(), event_type = event.event_type_str(), "event recorded");
                    }
                    Err(err) => {
                        tracing::error!(pool_id = %event.pool_id(), event_type = event.event_type_str(), error = %err, "failed to record event");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event recorder lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event recorder stopped");
    })
}
