// Orderd - Order tracking daemon
// Staged item workflow with idempotent JSON import and stage hand-off notifications

pub mod cli;
pub mod config;
pub mod engine;
pub mod import;
pub mod models;
pub mod notify;
pub mod server;
pub mod sidecar;
pub mod store;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use config::OrderdConfig;
pub use engine::{Transition, TransitionEngine, TransitionError};
pub use models::{Customer, Item, Order, Stage, StatusHistory};
pub use store::OrderStore;
