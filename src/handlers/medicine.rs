use teloxide::prelude::*;

use super::{is_reserved_input, report_store_error, HandlerResult, InventoryDialogue, State};
use crate::db::{
    models::{parse_expiry_date, parse_name, parse_quantity, NewMedicine},
    SharedStore, StoreError,
};
use crate::utils::format_date;

const RESERVED_NAME_REPLY: &str =
    "That looks like a command or menu button. Send the medicine name, or /cancel to stop.";

pub async fn receive_name(bot: Bot, dialogue: InventoryDialogue, msg: Message) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the medicine name as text.")
            .await?;
        return Ok(());
    };

    if is_reserved_input(text) {
        log::warn!("Rejected command-like medicine name: {}", text);
        bot.send_message(msg.chat.id, RESERVED_NAME_REPLY).await?;
        return Ok(());
    }

    match parse_name(text) {
        Ok(name) => {
            bot.send_message(msg.chat.id, "Quantity:").await?;
            dialogue.update(State::ReceiveQuantity { name }).await?;
        }
        Err(e) => {
            log::warn!("Rejected medicine name: {}", e);
            bot.send_message(msg.chat.id, format!("Invalid input: {}", e))
                .await?;
        }
    }

    Ok(())
}

pub async fn receive_quantity(
    bot: Bot,
    dialogue: InventoryDialogue,
    name: String,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the quantity as a number.")
            .await?;
        return Ok(());
    };

    match parse_quantity(text) {
        Ok(quantity) => {
            bot.send_message(msg.chat.id, "Expiry date (YYYY-MM-DD):")
                .await?;
            dialogue
                .update(State::ReceiveExpiry { name, quantity })
                .await?;
        }
        Err(e) => {
            log::warn!("Rejected quantity for '{}': {}", name, e);
            bot.send_message(msg.chat.id, format!("Invalid input: {}", e))
                .await?;
        }
    }

    Ok(())
}

pub async fn receive_expiry(
    bot: Bot,
    dialogue: InventoryDialogue,
    (name, quantity): (String, i32),
    msg: Message,
    store: SharedStore,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the expiry date as text (YYYY-MM-DD).")
            .await?;
        return Ok(());
    };

    let medicine = match parse_expiry_date(text)
        .and_then(|expiry_date| NewMedicine::new(&name, quantity, expiry_date))
    {
        Ok(medicine) => medicine,
        Err(e) => {
            log::warn!("Rejected expiry date for '{}': {}", name, e);
            bot.send_message(msg.chat.id, format!("Invalid input: {}", e))
                .await?;
            return Ok(());
        }
    };

    dialogue.exit().await?;

    match store.insert(&medicine).await {
        Ok(added) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Medicine added successfully! #{} {} ({} units, expires {})",
                    added.id,
                    added.name,
                    added.quantity,
                    format_date(added.expiry_date)
                ),
            )
            .await?;
        }
        Err(e) => report_store_error(&bot, msg.chat.id, &e).await?,
    }

    Ok(())
}

/// What a remove-by-name request does, given how many records share the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStep {
    NotFound,
    DeleteNow,
    Confirm(u64),
}

pub fn removal_step(count: u64) -> RemovalStep {
    match count {
        0 => RemovalStep::NotFound,
        1 => RemovalStep::DeleteNow,
        n => RemovalStep::Confirm(n),
    }
}

/// Counts the records named `name` and decides the next step.
/// Nothing is deleted here.
pub async fn plan_removal(store: &SharedStore, name: &str) -> Result<RemovalStep, StoreError> {
    store.count_by_name(name).await.map(removal_step)
}

/// Applies the user's reply to a pending multi-record removal.
///
/// Returns `None` when the reply is not a confirmation and nothing was touched.
pub async fn apply_confirmation(
    store: &SharedStore,
    name: &str,
    reply: &str,
) -> Result<Option<bool>, StoreError> {
    if !is_confirmation(reply) {
        return Ok(None);
    }
    store.delete_by_name(name).await.map(Some)
}

/// Deletes immediately when the name is unique; asks for confirmation when
/// the delete would take out several records.
pub async fn receive_removal_name(
    bot: Bot,
    dialogue: InventoryDialogue,
    msg: Message,
    store: SharedStore,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the medicine name as text.")
            .await?;
        return Ok(());
    };

    if is_reserved_input(text) {
        log::warn!("Rejected command-like removal name: {}", text);
        bot.send_message(msg.chat.id, RESERVED_NAME_REPLY).await?;
        return Ok(());
    }

    let name = text.trim().to_string();

    let step = match plan_removal(&store, &name).await {
        Ok(step) => step,
        Err(e) => {
            dialogue.exit().await?;
            return report_store_error(&bot, msg.chat.id, &e).await;
        }
    };

    match step {
        RemovalStep::NotFound => {
            dialogue.exit().await?;
            bot.send_message(msg.chat.id, "Medicine not found.").await?;
        }
        RemovalStep::DeleteNow => {
            dialogue.exit().await?;
            let result = store.delete_by_name(&name).await;
            send_removal_outcome(&bot, msg.chat.id, &name, 1, result).await?;
        }
        RemovalStep::Confirm(count) => {
            bot.send_message(msg.chat.id, removal_confirmation_prompt(&name, count))
                .await?;
            dialogue
                .update(State::ConfirmRemoval { name, count })
                .await?;
        }
    }

    Ok(())
}

pub async fn confirm_removal(
    bot: Bot,
    dialogue: InventoryDialogue,
    (name, count): (String, u64),
    msg: Message,
    store: SharedStore,
) -> HandlerResult {
    dialogue.exit().await?;

    match apply_confirmation(&store, &name, msg.text().unwrap_or_default()).await {
        Ok(None) => {
            log::info!("Removal of '{}' cancelled", name);
            bot.send_message(msg.chat.id, "Removal cancelled.").await?;
            Ok(())
        }
        Ok(Some(removed)) => {
            send_removal_outcome(&bot, msg.chat.id, &name, count, Ok(removed)).await
        }
        Err(e) => report_store_error(&bot, msg.chat.id, &e).await,
    }
}

pub async fn remove_by_id(bot: &Bot, chat_id: ChatId, store: &SharedStore, id: i64) -> HandlerResult {
    match store.delete_by_id(id).await {
        Ok(()) => {
            bot.send_message(chat_id, format!("Medicine #{} removed successfully.", id))
                .await?;
            Ok(())
        }
        Err(e) => report_store_error(bot, chat_id, &e).await,
    }
}

async fn send_removal_outcome(
    bot: &Bot,
    chat_id: ChatId,
    name: &str,
    expected: u64,
    result: Result<bool, StoreError>,
) -> HandlerResult {
    match result {
        Ok(true) if expected > 1 => {
            bot.send_message(chat_id, format!("All medicines named '{}' removed.", name))
                .await?;
        }
        Ok(true) => {
            bot.send_message(chat_id, "Medicine removed successfully.")
                .await?;
        }
        Ok(false) => {
            bot.send_message(chat_id, "Medicine not found.").await?;
        }
        Err(e) => report_store_error(bot, chat_id, &e).await?,
    }
    Ok(())
}

pub fn removal_confirmation_prompt(name: &str, count: u64) -> String {
    format!(
        "{} medicines are named '{}'. Removing by name deletes all of them. \
         Reply 'yes' to confirm, anything else to keep them. \
         Use /removeid to remove a single record.",
        count, name
    )
}

fn is_confirmation(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "yes" | "y")
}
