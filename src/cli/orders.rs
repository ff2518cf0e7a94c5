//! Orders command: list orders, optionally filtered by item stage

use crate::models::Stage;
use crate::store::OrderStore;
use crate::{OrderdConfig, Result};
use colored::Colorize;

pub fn run(status: Option<&str>, json: bool) -> Result<()> {
    let config = OrderdConfig::load_default()?;
    let store = OrderStore::open(config.store_path())?;

    let filter = match status {
        Some(raw) => Some(
            Stage::parse(raw).ok_or_else(|| anyhow::anyhow!("unknown stage '{}'", raw))?,
        ),
        None => None,
    };

    let views = store.query(filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("{}", "No orders found.".yellow());
        return Ok(());
    }

    for view in &views {
        println!("\n{}", view.order_id.bold());
        println!(
            "   Customer: {} <{}>",
            view.customer.name, view.customer.email
        );
        println!("   Total: ${:.2}   Status: {}", view.total, view.status);
        for item in &view.items {
            println!(
                "   • [{}] {} x{} @ ${:.2} - {}",
                item.id,
                item.name,
                item.quantity,
                item.price,
                item.status.name().cyan()
            );
        }
        if !view.status_history.is_empty() {
            println!("   History:");
            for entry in &view.status_history {
                println!("     {} {} - {}", entry.timestamp, entry.status, entry.notes);
            }
        }
    }

    Ok(())
}
