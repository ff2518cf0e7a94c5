//! Stage transition engine
//!
//! Applies exactly one validated transition to one item. The stage update and
//! its history entry persist together through the store's atomic commit; the
//! sidecar sync and the notification are side effects that never unwind a
//! persisted transition.
//!
//! Transitions are strictly sequential: the requested stage must be the
//! immediate successor of the item's current stage. This makes the terminal
//! stage a hard stop and the sidecar sync fire at most once per order item.

use crate::config::OrderdConfig;
use crate::models::{Item, Stage, StatusHistory};
use crate::notify::{self, Notification};
use crate::sidecar;
use crate::store::{OrderStore, StoreError};
use crate::Colorize;
use chrono::Utc;

/// Result type for transitions
pub type TransitionResult<T> = Result<T, TransitionError>;

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("item {0} not found")]
    ItemNotFound(u64),

    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A persisted transition plus its out-of-band side-effect artifacts
#[derive(Debug)]
pub struct Transition {
    pub item: Item,
    pub entry: StatusHistory,

    /// Composed hand-off message, if a recipient is configured for the stage.
    /// Dispatch is the caller's job; delivery failure never rolls back state.
    pub notification: Option<Notification>,
}

/// The transition engine, configured once at startup
pub struct TransitionEngine {
    config: OrderdConfig,
}

impl TransitionEngine {
    pub fn new(config: OrderdConfig) -> Self {
        Self { config }
    }

    /// Advance one item to the requested stage
    ///
    /// Fails without touching the store when the item is unknown, the stage
    /// string is outside the catalog, or the stage is not the immediate
    /// successor of the item's current stage.
    pub fn advance(
        &self,
        store: &mut OrderStore,
        item_id: u64,
        next_stage: &str,
        notes: Option<&str>,
    ) -> TransitionResult<Transition> {
        let stage = Stage::parse(next_stage)
            .ok_or_else(|| TransitionError::UnknownStage(next_stage.to_string()))?;

        let item = store
            .item(item_id)
            .ok_or(TransitionError::ItemNotFound(item_id))?;
        let current = item.status;

        if current.successor() != Some(stage) {
            return Err(TransitionError::InvalidTransition {
                from: current,
                to: stage,
            });
        }

        let order = store
            .order(item.order_id)
            .ok_or_else(|| StoreError::OrderNotFound(format!("#{}", item.order_id)))?
            .clone();
        let customer = store
            .customer(order.customer_id)
            .ok_or_else(|| StoreError::OrderNotFound(order.order_id.clone()))?
            .clone();

        let notes = match notes {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => format!("Item moved to {}", stage),
        };

        let (item, entry) = store.apply_transition(item_id, stage, Utc::now(), notes.clone())?;

        if stage.is_terminal() {
            if let Err(e) = sidecar::sync_completed(&self.config.sidecar_dir, &order.order_id) {
                eprintln!(
                    "{}",
                    format!(
                        "⚠ Could not update sidecar for order {}: {}",
                        order.order_id, e
                    )
                    .yellow()
                );
            }
        }

        let notification =
            match notify::compose(&self.config.notify, &order, &customer, &item, stage, &notes) {
                Ok(note) => Some(note),
                Err(e) => {
                    eprintln!("{}", format!("⚠ Notification not composed: {}", e).yellow());
                    None
                }
            };

        Ok(Transition {
            item,
            entry,
            notification,
        })
    }
}
