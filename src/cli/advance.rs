//! Advance command: apply one stage transition to an item

use crate::engine::TransitionEngine;
use crate::notify;
use crate::store::OrderStore;
use crate::{OrderdConfig, Result};
use colored::Colorize;

pub async fn run(item_id: u64, next_stage: &str, notes: Option<&str>) -> Result<()> {
    let config = OrderdConfig::load_default()?;
    let mut store = OrderStore::open(config.store_path())?;
    let notifier = notify::build_notifier(&config.notify);
    let engine = TransitionEngine::new(config);

    let transition = engine.advance(&mut store, item_id, next_stage, notes)?;
    println!(
        "{}",
        format!(
            "✓ Item {} ({}) moved to {}",
            transition.item.id, transition.item.name, transition.item.status
        )
        .green()
    );

    // The transition is already persisted; a failed send is only reported
    if let Some(note) = &transition.notification {
        match notifier.send(note).await {
            Ok(()) => println!("{}", format!("✓ Notified {}", note.to).cyan()),
            Err(e) => eprintln!("{}", format!("⚠ Notification failed: {}", e).yellow()),
        }
    }

    Ok(())
}
