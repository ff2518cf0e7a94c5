//! Persistent order records and response views
//!
//! Customers are shared across orders, items belong to exactly one order,
//! and status history is an append-only log per order.

use super::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer, created lazily on first order import
///
/// Identity is the full field tuple; two customers with the same name but
/// different contact details are distinct records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl Customer {
    /// Field-tuple identity check used by get-or-create
    pub fn matches(&self, name: &str, email: &str, phone: &str, address: &str) -> bool {
        self.name == name && self.email == email && self.phone == phone && self.address == address
    }
}

/// An order with a globally unique external identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,

    /// External order identifier (e.g., "ORDER_20250612_114522")
    pub order_id: String,

    pub timestamp: DateTime<Utc>,
    pub customer_id: u64,
    pub total: f64,

    /// Order-level status, tracked independently of item stages
    pub current_status: Stage,
}

/// A line item, owned by its order
///
/// Quantity and price are captured at order time and never recomputed from a
/// live catalog. Each item moves through the stage workflow independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: u64,
    pub order_id: u64,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub status: Stage,
}

/// Append-only status log entry; never edited or deleted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusHistory {
    pub id: u64,
    pub order_id: u64,
    pub status: Stage,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

// =============================================================================
// Response views (orders-by-stage query)
// =============================================================================

/// One order in a query response: nested customer, the items matching the
/// stage filter, and the full status history
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order_id: String,
    pub customer: CustomerView,
    pub items: Vec<ItemView>,
    pub total: f64,
    pub status: Stage,
    pub created_at: String,
    pub status_history: Vec<HistoryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub id: u64,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub status: Stage,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub status: Stage,
    pub timestamp: String,
    pub notes: String,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price,
            status: item.status,
        }
    }
}

impl From<&StatusHistory> for HistoryView {
    fn from(entry: &StatusHistory) -> Self {
        Self {
            status: entry.status,
            timestamp: entry.timestamp.to_rfc3339(),
            notes: entry.notes.clone(),
        }
    }
}
