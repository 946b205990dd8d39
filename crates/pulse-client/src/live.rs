use std::collections::HashMap;

use pulse_types::events::GatewayEvent;
use pulse_types::models::{Chart, DataPoint};

/// Locally accumulated points from `chart_update` events, keyed by chart
/// id. Grows by one point per event, is never truncated, and lives only
/// in memory; after a reload the REST snapshot is the sole history.
#[derive(Debug, Default)]
pub struct LiveSeries {
    by_chart: HashMap<i64, Vec<DataPoint>>,
}

impl LiveSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a gateway event. Non-chart events are ignored.
    pub fn apply(&mut self, event: &GatewayEvent) {
        if let GatewayEvent::ChartUpdate { id, point } = event {
            self.push(*id, *point);
        }
    }

    pub fn push(&mut self, id: i64, point: DataPoint) {
        self.by_chart.entry(id).or_default().push(point);
    }

    pub fn series(&self, id: i64) -> &[DataPoint] {
        self.by_chart.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Render-time merge: the snapshot's series followed by the locally
    /// buffered live points for the same chart. The two sources stay
    /// independent; this only builds a combined view.
    pub fn merged_with(&self, chart: &Chart) -> Vec<DataPoint> {
        let live = self.series(chart.id);
        let mut merged = Vec::with_capacity(chart.series.len() + live.len());
        merged.extend_from_slice(&chart.series);
        merged.extend_from_slice(live);
        merged
    }
}
