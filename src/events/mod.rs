use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ledger::{LedgerStatus, StockDirection};

/// Which cached-counter entity a status change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntity {
    RmReceiving,
    HoldMaterial,
}

/// Domain events emitted after a ledger write commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    RmReceivingCreated {
        uid: Uuid,
        heatno: String,
        reciving_weight_kg: Decimal,
    },
    HoldMaterialCreated {
        batch_id: String,
        rm_receiving_uid: Option<Uuid>,
        hold_material_qty_kg: Decimal,
    },
    MaterialIssued {
        issue_id: String,
        batch_id: String,
        issue_qty_kg: Decimal,
    },
    LedgerStatusChanged {
        entity: LedgerEntity,
        key: String,
        old_status: LedgerStatus,
        new_status: LedgerStatus,
        remaining: Decimal,
    },
    StockMoved {
        transaction_id: i32,
        material_id: i32,
        location_id: i32,
        direction: StockDirection,
        qty: i32,
    },
    ReconciliationCompleted {
        sweep: String,
        examined: u64,
        corrected: u64,
        finished_at: DateTime<Utc>,
    },
}

impl LedgerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::RmReceivingCreated { .. } => "rm_receiving_created",
            LedgerEvent::HoldMaterialCreated { .. } => "hold_material_created",
            LedgerEvent::MaterialIssued { .. } => "material_issued",
            LedgerEvent::LedgerStatusChanged { .. } => "ledger_status_changed",
            LedgerEvent::StockMoved { .. } => "stock_moved",
            LedgerEvent::ReconciliationCompleted { .. } => "reconciliation_completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<LedgerEvent>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<LedgerEvent>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: LedgerEvent) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event for a write that has already committed. A closed or
    /// full channel is logged and otherwise ignored.
    pub async fn emit(&self, event: LedgerEvent) {
        let kind = event.kind();
        if let Err(e) = self.send(event).await {
            counter!("plant_ledger.events.dropped", 1, "kind" => kind);
            warn!(kind, error = %e, "ledger event dropped");
        }
    }

    pub async fn emit_all(&self, events: Vec<LedgerEvent>) {
        for event in events {
            self.emit(event).await;
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<LedgerEvent>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("plant_ledger.events.processed", 1, "kind" => event.kind());
        match &event {
            LedgerEvent::LedgerStatusChanged {
                entity,
                key,
                old_status,
                new_status,
                remaining,
            } => {
                info!(
                    ?entity,
                    key = %key,
                    from = %old_status,
                    to = %new_status,
                    remaining = %remaining,
                    "ledger status changed"
                );
            }
            LedgerEvent::ReconciliationCompleted {
                sweep,
                examined,
                corrected,
                ..
            } => {
                if *corrected > 0 {
                    warn!(sweep = %sweep, examined, corrected, "reconciliation corrected drift");
                } else {
                    info!(sweep = %sweep, examined, "reconciliation found no drift");
                }
            }
            other => {
                let payload = serde_json::to_string(other).unwrap_or_default();
                info!(kind = other.kind(), payload = %payload, "ledger event");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn emit_on_closed_channel_does_not_fail() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        sender
            .emit(LedgerEvent::MaterialIssued {
                issue_id: "ISSUE-0A1B2C3D".into(),
                batch_id: "PP-20250314-AC-01".into(),
                issue_qty_kg: dec!(10),
            })
            .await;
        assert!(sender
            .send(LedgerEvent::RmReceivingCreated {
                uid: Uuid::nil(),
                heatno: "h1".into(),
                reciving_weight_kg: dec!(1),
            })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn processor_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(process_events(rx));
        let sender = EventSender::new(tx);
        sender
            .emit(LedgerEvent::ReconciliationCompleted {
                sweep: "hold_materials".into(),
                examined: 3,
                corrected: 0,
                finished_at: Utc::now(),
            })
            .await;
        drop(sender);
        handle.await.unwrap();
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(LedgerEvent::StockMoved {
            transaction_id: 1,
            material_id: 2,
            location_id: 3,
            direction: StockDirection::Out,
            qty: 5,
        })
        .unwrap();
        assert_eq!(json["type"], "stock_moved");
        assert_eq!(json["direction"], "OUT");
    }
}
