use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};

use pulse_db::Database;
use pulse_gateway::dispatcher::Dispatcher;
use pulse_types::events::GatewayEvent;
use pulse_types::models::DataPoint;

/// Where the synthetic values come from. Swappable so tests can feed a
/// known sequence instead of randomness.
pub trait ValueSource: Send {
    fn next_value(&mut self) -> f64;
}

/// Reference source: uniform random integers in [0, 100).
pub struct UniformRandom;

impl ValueSource for UniformRandom {
    fn next_value(&mut self) -> f64 {
        rand::rng().random_range(0..100) as f64
    }
}

/// Background task that appends one generated point to every chart on a
/// fixed period and publishes each append to connected clients.
///
/// Appends go through the store's atomic array-append, so a tick can
/// interleave with an admin's wholesale replace without either write
/// clobbering the other.
pub struct Broadcaster {
    db: Arc<Database>,
    dispatcher: Dispatcher,
    period: Duration,
    source: Box<dyn ValueSource>,
}

impl Broadcaster {
    pub fn new(
        db: Arc<Database>,
        dispatcher: Dispatcher,
        period: Duration,
        source: Box<dyn ValueSource>,
    ) -> Self {
        Self {
            db,
            dispatcher,
            period,
            source,
        }
    }

    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.period);

        loop {
            interval.tick().await;

            if let Err(e) = self.tick().await {
                warn!("Broadcast tick failed: {:#}", e);
            }
        }
    }

    /// One tick: generate, append, notify, per chart. A chart that fails
    /// or vanishes is skipped until the next tick; the rest of the sweep
    /// continues.
    async fn tick(&mut self) -> Result<()> {
        let db = self.db.clone();
        let ids = tokio::task::spawn_blocking(move || db.list_chart_ids()).await??;

        for id in ids {
            let point = DataPoint {
                timestamp: Utc::now().timestamp_millis(),
                value: self.source.next_value(),
            };

            let db = self.db.clone();
            let appended = tokio::task::spawn_blocking(move || db.append_point(id, point)).await?;

            match appended {
                Ok(true) => {
                    // Notify only after the point is durably appended
                    self.dispatcher.broadcast(GatewayEvent::ChartUpdate { id, point });
                }
                Ok(false) => {
                    debug!("Chart {} vanished mid-tick, skipping", id);
                }
                Err(e) => {
                    warn!("Append failed for chart {}: {:#}", id, e);
                }
            }
        }

        Ok(())
    }
}
