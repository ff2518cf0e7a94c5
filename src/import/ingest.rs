//! Idempotent order ingest
//!
//! Accepts a denormalized order payload (or a batch of them) and materializes
//! each into the store exactly once. Re-submitting a known `order_id` is a
//! reported no-op; malformed records are skipped with a warning and the rest
//! of the batch continues.

use crate::models::{OrderPayload, PayloadValidator, Stage};
use crate::store::{NewCustomer, NewHistoryEntry, NewItem, NewOrder, OrderStore, StoreError};
use crate::Result;
use serde::Serialize;
use serde_json::Value;

/// What happened to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Created,
    AlreadyExists,
}

/// Aggregate result of one ingest call
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub skipped_existing: usize,
    pub skipped_malformed: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::AlreadyExists => self.skipped_existing += 1,
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.skipped_malformed += 1;
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ImportReport) {
        self.created += other.created;
        self.skipped_existing += other.skipped_existing;
        self.skipped_malformed += other.skipped_malformed;
        self.warnings.extend(other.warnings);
    }
}

/// Ingest a JSON value holding one order object or an array of them
///
/// A single top-level object is treated as a one-element batch. Only store
/// persistence failures abort the call; bad records are recorded in the
/// report and skipped.
pub fn ingest_value(
    store: &mut OrderStore,
    validator: &PayloadValidator,
    value: &Value,
) -> Result<ImportReport> {
    let records: Vec<&Value> = match value {
        Value::Array(entries) => entries.iter().collect(),
        other => vec![other],
    };

    let mut report = ImportReport::default();

    for (index, record) in records.into_iter().enumerate() {
        match validator.validate(record) {
            Ok(payload) => {
                let order_id = payload.order_id.clone();
                match ingest_payload(store, payload) {
                    Ok(outcome) => report.record(outcome),
                    Err(e) => {
                        // Persistence failure is fatal: nothing later in the
                        // batch can succeed either
                        return Err(e.context(format!("failed to persist order '{}'", order_id)));
                    }
                }
            }
            Err(e) => report.warn(format!("record {}: {}", index, e)),
        }
    }

    Ok(report)
}

/// Materialize one validated payload, exactly once per `order_id`
pub fn ingest_payload(store: &mut OrderStore, payload: OrderPayload) -> Result<RecordOutcome> {
    if store.contains_order(&payload.order_id) {
        return Ok(RecordOutcome::AlreadyExists);
    }

    let history = if payload.status_history.is_empty() {
        // Synthetic creation entry, stamped with the order's own timestamp
        vec![NewHistoryEntry {
            status: Stage::first(),
            timestamp: payload.timestamp,
            notes: "Order created".to_string(),
        }]
    } else {
        payload
            .status_history
            .into_iter()
            .map(|h| NewHistoryEntry {
                status: h.status,
                timestamp: h.timestamp,
                notes: h.notes,
            })
            .collect()
    };

    let new_order = NewOrder {
        order_id: payload.order_id,
        timestamp: payload.timestamp,
        customer: NewCustomer {
            name: payload.customer.name,
            email: payload.customer.email,
            phone: payload.customer.phone,
            address: payload.customer.address,
        },
        total: payload.total,
        items: payload
            .items
            .into_iter()
            .map(|i| NewItem {
                name: i.name,
                quantity: i.quantity,
                price: i.price,
            })
            .collect(),
        history,
    };

    match store.insert_order(new_order) {
        Ok(_) => Ok(RecordOutcome::Created),
        // Lost a race with a concurrent import of the same order: still a no-op
        Err(StoreError::OrderExists(_)) => Ok(RecordOutcome::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_order(order_id: &str) -> Value {
        json!({
            "order_id": order_id,
            "timestamp": "2025-06-12T11:45:22+00:00",
            "customer": {
                "name": "Ada",
                "email": "ada@example.com",
                "phone": "555-0100",
                "address": "1 Engine St"
            },
            "total": 20.0,
            "items": [
                { "name": "Widget", "quantity": 2, "price": 5.0 },
                { "name": "Gadget", "quantity": 1, "price": 10.0 }
            ]
        })
    }

    fn open_store(temp: &TempDir) -> OrderStore {
        OrderStore::open(temp.path().join("orders.json")).unwrap()
    }

    #[test]
    fn test_import_creates_order_with_synthetic_history() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let validator = PayloadValidator::new();

        let report = ingest_value(&mut store, &validator, &sample_order("ORD-1")).unwrap();
        assert_eq!(report.created, 1);

        let order = store.order_by_external_id("ORD-1").unwrap();
        let history = store.history_for_order(order.id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, Stage::Material);
        assert_eq!(history[0].notes, "Order created");
    }

    #[test]
    fn test_import_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let validator = PayloadValidator::new();

        ingest_value(&mut store, &validator, &sample_order("ORD-1")).unwrap();
        let report = ingest_value(&mut store, &validator, &sample_order("ORD-1")).unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(store.order_count(), 1);
        assert_eq!(store.customer_count(), 1);
        assert_eq!(store.item_count(), 2);
        assert_eq!(store.history_count(), 1);
    }

    #[test]
    fn test_supplied_history_is_materialized() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let validator = PayloadValidator::new();

        let mut record = sample_order("ORD-1");
        record["status_history"] = json!([
            { "status": "Material", "timestamp": "2025-06-12 11:45:22", "notes": "Order created" },
            { "status": "Manufacturing", "timestamp": "2025-06-13 09:00:00", "notes": "started" }
        ]);

        ingest_value(&mut store, &validator, &record).unwrap();
        let order = store.order_by_external_id("ORD-1").unwrap();
        assert_eq!(store.history_for_order(order.id).len(), 2);
    }

    #[test]
    fn test_batch_continues_past_malformed_record() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let validator = PayloadValidator::new();

        let batch = json!([
            sample_order("ORD-1"),
            "not an order",
            { "timestamp": "2025-06-12T11:45:22+00:00" },
            sample_order("ORD-2")
        ]);

        let report = ingest_value(&mut store, &validator, &batch).unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.skipped_malformed, 2);
        assert_eq!(report.warnings.len(), 2);
        assert!(store.contains_order("ORD-1"));
        assert!(store.contains_order("ORD-2"));
    }

    #[test]
    fn test_single_object_treated_as_batch_of_one() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let validator = PayloadValidator::new();

        let report = ingest_value(&mut store, &validator, &sample_order("ORD-1")).unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped_malformed, 0);
    }

    #[test]
    fn test_scenario_widget_gadget() {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let validator = PayloadValidator::new();

        ingest_value(&mut store, &validator, &sample_order("ORD-1")).unwrap();

        let order = store.order_by_external_id("ORD-1").unwrap().clone();
        assert_eq!(order.total, 20.0);
        assert_eq!(order.current_status, Stage::Material);

        let items = store.items_for_order(order.id);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.status == Stage::Material));
    }
}
