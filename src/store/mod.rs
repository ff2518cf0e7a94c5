//! File-backed order store
//!
//! All records live in a single `orders.json` under the data directory and
//! are held in memory while the process runs. Every mutation is applied to a
//! working copy, persisted with an atomic rename, and only then swapped into
//! memory - a failed write leaves both memory and disk unchanged, so the
//! item-stage update and its history entry commit together or not at all.

use crate::models::{
    Customer, CustomerView, HistoryView, Item, ItemView, Order, OrderView, Stage, StatusHistory,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("order '{0}' already exists")]
    OrderExists(String),

    #[error("order '{0}' not found")]
    OrderNotFound(String),

    #[error("item {0} not found")]
    ItemNotFound(u64),

    #[error("invalid store path: {0}")]
    InvalidPath(String),
}

/// Input for materializing one imported order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub timestamp: DateTime<Utc>,
    pub customer: NewCustomer,
    pub total: f64,
    pub items: Vec<NewItem>,
    pub history: Vec<NewHistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub status: Stage,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

/// Serialized store contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    customers: Vec<Customer>,
    #[serde(default)]
    orders: Vec<Order>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    history: Vec<StatusHistory>,
    /// Shared id sequence across all record kinds
    #[serde(default = "first_id")]
    next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl StoreData {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// The persistent order store
pub struct OrderStore {
    path: PathBuf,
    data: StoreData,
}

impl OrderStore {
    /// Open the store file, creating an empty store if it does not exist
    ///
    /// A file that fails to parse is backed up to `.bak` and replaced with an
    /// empty store rather than refusing to start.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let data = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<StoreData>(&content) {
                Ok(data) => data,
                Err(e) => {
                    eprintln!(
                        "Warning: failed to parse {}: {}. Backing up and starting fresh.",
                        path.display(),
                        e
                    );
                    let backup_path = path.with_extension("json.bak");
                    if let Err(backup_err) = fs::rename(&path, &backup_path) {
                        eprintln!("Warning: failed to back up corrupt store: {}", backup_err);
                    }
                    StoreData {
                        next_id: 1,
                        ..Default::default()
                    }
                }
            }
        } else {
            StoreData {
                next_id: 1,
                ..Default::default()
            }
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a working copy, then swap it into memory
    fn commit(&mut self, data: StoreData) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(&data)?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath("store path has no parent".to_string()))?;
        fs::create_dir_all(parent)?;

        // Atomic write: temp file in the same directory, then rename over
        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file
            .persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;

        self.data = data;
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn contains_order(&self, order_id: &str) -> bool {
        self.data.orders.iter().any(|o| o.order_id == order_id)
    }

    pub fn order_by_external_id(&self, order_id: &str) -> Option<&Order> {
        self.data.orders.iter().find(|o| o.order_id == order_id)
    }

    pub fn order(&self, id: u64) -> Option<&Order> {
        self.data.orders.iter().find(|o| o.id == id)
    }

    pub fn item(&self, id: u64) -> Option<&Item> {
        self.data.items.iter().find(|i| i.id == id)
    }

    pub fn customer(&self, id: u64) -> Option<&Customer> {
        self.data.customers.iter().find(|c| c.id == id)
    }

    pub fn items_for_order(&self, order_id: u64) -> Vec<&Item> {
        self.data
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .collect()
    }

    pub fn history_for_order(&self, order_id: u64) -> Vec<&StatusHistory> {
        self.data
            .history
            .iter()
            .filter(|h| h.order_id == order_id)
            .collect()
    }

    pub fn order_count(&self) -> usize {
        self.data.orders.len()
    }

    pub fn customer_count(&self) -> usize {
        self.data.customers.len()
    }

    pub fn item_count(&self) -> usize {
        self.data.items.len()
    }

    pub fn history_count(&self) -> usize {
        self.data.history.len()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Materialize one imported order in a single commit
    ///
    /// The customer is resolved by get-or-create on the full field tuple.
    /// All items start at the first catalog stage. A duplicate `order_id`
    /// fails with `OrderExists` and changes nothing.
    pub fn insert_order(&mut self, new: NewOrder) -> StoreResult<Order> {
        if self.contains_order(&new.order_id) {
            return Err(StoreError::OrderExists(new.order_id));
        }

        let mut data = self.data.clone();

        let customer_id = match data.customers.iter().find(|c| {
            c.matches(
                &new.customer.name,
                &new.customer.email,
                &new.customer.phone,
                &new.customer.address,
            )
        }) {
            Some(existing) => existing.id,
            None => {
                let id = data.allocate_id();
                data.customers.push(Customer {
                    id,
                    name: new.customer.name,
                    email: new.customer.email,
                    phone: new.customer.phone,
                    address: new.customer.address,
                });
                id
            }
        };

        let order_id = data.allocate_id();
        let order = Order {
            id: order_id,
            order_id: new.order_id,
            timestamp: new.timestamp,
            customer_id,
            total: new.total,
            current_status: Stage::first(),
        };
        data.orders.push(order.clone());

        for item in new.items {
            let id = data.allocate_id();
            data.items.push(Item {
                id,
                order_id,
                name: item.name,
                quantity: item.quantity,
                price: item.price,
                status: Stage::first(),
            });
        }

        for entry in new.history {
            let id = data.allocate_id();
            data.history.push(StatusHistory {
                id,
                order_id,
                status: entry.status,
                timestamp: entry.timestamp,
                notes: entry.notes,
            });
        }

        self.commit(data)?;
        Ok(order)
    }

    /// Set an item's stage and append the matching history entry together
    pub fn apply_transition(
        &mut self,
        item_id: u64,
        stage: Stage,
        timestamp: DateTime<Utc>,
        notes: String,
    ) -> StoreResult<(Item, StatusHistory)> {
        let mut data = self.data.clone();

        let item = data
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(StoreError::ItemNotFound(item_id))?;
        item.status = stage;
        let order_id = item.order_id;
        let updated_item = item.clone();

        let id = data.allocate_id();
        let entry = StatusHistory {
            id,
            order_id,
            status: stage,
            timestamp,
            notes,
        };
        data.history.push(entry.clone());

        self.commit(data)?;
        Ok((updated_item, entry))
    }

    /// Delete an order and everything it owns (items, history)
    pub fn delete_order(&mut self, order_id: &str) -> StoreResult<()> {
        let order = self
            .order_by_external_id(order_id)
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;
        let id = order.id;

        let mut data = self.data.clone();
        data.orders.retain(|o| o.id != id);
        data.items.retain(|i| i.order_id != id);
        data.history.retain(|h| h.order_id != id);

        self.commit(data)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Orders-by-stage query
    ///
    /// An order is included only if it has at least one item matching the
    /// filter; the item list carries only matching items, the history is
    /// always complete. With no filter, every order with at least one item
    /// is returned with all its items.
    pub fn query(&self, filter: Option<Stage>) -> Vec<OrderView> {
        let mut views = Vec::new();

        for order in &self.data.orders {
            let items: Vec<ItemView> = self
                .items_for_order(order.id)
                .into_iter()
                .filter(|i| filter.map_or(true, |stage| i.status == stage))
                .map(ItemView::from)
                .collect();

            if items.is_empty() {
                continue;
            }

            let customer = match self.customer(order.customer_id) {
                Some(c) => CustomerView {
                    name: c.name.clone(),
                    email: c.email.clone(),
                },
                None => continue,
            };

            views.push(OrderView {
                order_id: order.order_id.clone(),
                customer,
                items,
                total: order.total,
                status: order.current_status,
                created_at: order.timestamp.to_rfc3339(),
                status_history: self
                    .history_for_order(order.id)
                    .into_iter()
                    .map(HistoryView::from)
                    .collect(),
            });
        }

        views
    }
}
