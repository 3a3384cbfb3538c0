use chrono::NaiveDate;
use teloxide::prelude::*;

use super::{report_store_error, send_long, HandlerResult, InventoryDialogue};
use crate::db::{models::parse_expiry_date, models::Medicine, SharedStore};
use crate::utils::format_date;

/// Sends the full inventory table to `chat_id`.
pub async fn list_inventory(bot: &Bot, chat_id: ChatId, store: &SharedStore) -> HandlerResult {
    match store.list_all().await {
        Ok(medicines) => send_long(bot, chat_id, &format_inventory(&medicines)).await,
        Err(e) => report_store_error(bot, chat_id, &e).await,
    }
}

/// Answers the expiry prompt with every medicine expiring on or before the given date.
pub async fn receive_expiry_threshold(
    bot: Bot,
    dialogue: InventoryDialogue,
    msg: Message,
    store: SharedStore,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the date as text (YYYY-MM-DD).")
            .await?;
        return Ok(());
    };

    let threshold = match parse_expiry_date(text) {
        Ok(date) => date,
        Err(e) => {
            log::warn!("Rejected expiry threshold: {}", e);
            bot.send_message(msg.chat.id, format!("Invalid input: {}", e))
                .await?;
            return Ok(());
        }
    };

    dialogue.exit().await?;

    match store.query_expiring_by(threshold).await {
        Ok(medicines) => {
            send_long(&bot, msg.chat.id, &format_expiry_report(threshold, &medicines)).await
        }
        Err(e) => report_store_error(&bot, msg.chat.id, &e).await,
    }
}

pub fn format_inventory(medicines: &[Medicine]) -> String {
    if medicines.is_empty() {
        return "No medicines found in the inventory".to_string();
    }

    let entries = medicines
        .iter()
        .map(|medicine| {
            format!(
                "🏥 #{} {}\n   Quantity: {} units\n   Expires: {}",
                medicine.id,
                medicine.name,
                medicine.quantity,
                format_date(medicine.expiry_date)
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n");

    format!("Inventory ({} records):\n\n{}", medicines.len(), entries)
}

pub fn format_expiry_report(threshold: NaiveDate, medicines: &[Medicine]) -> String {
    let threshold = format_date(threshold);
    if medicines.is_empty() {
        return format!("No medicines expire on or before {}.", threshold);
    }

    let mut report = format!("Medicines expiring on or before {}:\n", threshold);
    for medicine in medicines {
        report.push_str(&format!(
            "{} (Expiry: {})\n",
            medicine.name,
            format_date(medicine.expiry_date)
        ));
    }
    report
}
