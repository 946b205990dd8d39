use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::DataPoint;

/// Events sent over the WebSocket gateway. Delivery is at-most-once and
/// best-effort; there is no replay buffer for late joiners.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// Server confirms the connection is authenticated and live
    Ready { user_id: Uuid, email: String },

    /// The broadcaster appended one point to a chart's stored series
    ChartUpdate { id: i64, point: DataPoint },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_update_wire_shape() {
        let event = GatewayEvent::ChartUpdate {
            id: 7,
            point: DataPoint {
                timestamp: 1_700_000_000_000,
                value: 42.0,
            },
        };

        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(json["type"], "chart_update");
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(json["data"]["point"]["value"], 42.0);
    }
}
