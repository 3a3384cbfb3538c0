use phf::phf_map;
use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        UpdateHandler,
    },
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, ReplyMarkup},
    utils::command::BotCommands,
};

use crate::db::{SharedStore, StoreError};
use crate::utils::{split_message, MAX_MESSAGE_LEN};

pub mod inventory;
pub mod medicine;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), Error>;
pub type InventoryDialogue = Dialogue<State, InMemStorage<State>>;

#[derive(BotCommands, Debug, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start interacting with PharmaSync.")]
    Start,
    #[command(description = "Display help information about available commands.")]
    Help,
    #[command(description = "Display the main menu.")]
    Menu,
    #[command(description = "View the whole inventory.")]
    Inventory,
    #[command(description = "Add a medicine to the inventory.")]
    Add,
    #[command(description = "Remove every medicine with a given name.")]
    Remove,
    #[command(description = "Remove a single medicine by its id.")]
    RemoveId(i64),
    #[command(description = "List medicines expiring on or before a date.")]
    Expiry,
    #[command(description = "Cancel the current operation.")]
    Cancel,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub enum State {
    #[default]
    Start,
    ReceiveName,
    ReceiveQuantity {
        name: String,
    },
    ReceiveExpiry {
        name: String,
        quantity: i32,
    },
    ReceiveRemovalName,
    ConfirmRemoval {
        name: String,
        count: u64,
    },
    ReceiveExpiryThreshold,
}

pub const VIEW_INVENTORY_BUTTON: &str = "📋 View Inventory";
pub const ADD_MEDICINE_BUTTON: &str = "➕ Add Medicine";
pub const REMOVE_MEDICINE_BUTTON: &str = "➖ Remove Medicine";
pub const CHECK_EXPIRY_BUTTON: &str = "⏰ Check Expiry";

/// Main-menu buttons and the command each one stands for.
static MENU_ACTIONS: phf::Map<&'static str, Command> = phf_map! {
    "📋 View Inventory" => Command::Inventory,
    "➕ Add Medicine" => Command::Add,
    "➖ Remove Medicine" => Command::Remove,
    "⏰ Check Expiry" => Command::Expiry,
};

/// Text that is a command or a menu label rather than a value.
///
/// Commands that fail to parse (`/removeid` with no id) fall through to the
/// dialogue states, so those states must not take them as data.
pub(crate) fn is_reserved_input(text: &str) -> bool {
    let text = text.trim();
    text.starts_with('/') || MENU_ACTIONS.contains_key(text)
}

/// Builds the update handler tree.
///
/// Commands are matched first so that `/cancel` (or any other command)
/// works from inside a dialogue. Plain messages are then routed by the
/// current dialogue state.
pub fn schema() -> UpdateHandler<Error> {
    use dptree::case;

    let message_handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(answer))
        .branch(case![State::ReceiveName].endpoint(medicine::receive_name))
        .branch(case![State::ReceiveQuantity { name }].endpoint(medicine::receive_quantity))
        .branch(
            case![State::ReceiveExpiry { name, quantity }].endpoint(medicine::receive_expiry),
        )
        .branch(case![State::ReceiveRemovalName].endpoint(medicine::receive_removal_name))
        .branch(case![State::ConfirmRemoval { name, count }].endpoint(medicine::confirm_removal))
        .branch(
            case![State::ReceiveExpiryThreshold].endpoint(inventory::receive_expiry_threshold),
        )
        .branch(case![State::Start].endpoint(handle_message));

    dialogue::enter::<Update, InMemStorage<State>, State, _>().branch(message_handler)
}

/// Handles bot commands and responds accordingly.
async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: InventoryDialogue,
    store: SharedStore,
) -> HandlerResult {
    log::info!("Received command {:?} in chat {}", cmd, msg.chat.id);
    run_command(bot, msg, cmd, dialogue, store).await
}

async fn run_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: InventoryDialogue,
    store: SharedStore,
) -> HandlerResult {
    match cmd {
        Command::Start | Command::Menu => {
            dialogue.reset().await?;
            bot.send_message(
                msg.chat.id,
                "Welcome to PharmaSync! Please choose an option:",
            )
            .reply_markup(ReplyMarkup::Keyboard(main_menu()))
            .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Inventory => {
            inventory::list_inventory(&bot, msg.chat.id, &store).await?;
        }
        Command::Add => {
            bot.send_message(msg.chat.id, "Medicine name:").await?;
            dialogue.update(State::ReceiveName).await?;
        }
        Command::Remove => {
            bot.send_message(msg.chat.id, "Enter the medicine name to remove:")
                .await?;
            dialogue.update(State::ReceiveRemovalName).await?;
        }
        Command::RemoveId(id) => {
            medicine::remove_by_id(&bot, msg.chat.id, &store, id).await?;
        }
        Command::Expiry => {
            bot.send_message(
                msg.chat.id,
                "Enter the date to check expiry (YYYY-MM-DD):",
            )
            .await?;
            dialogue.update(State::ReceiveExpiryThreshold).await?;
        }
        Command::Cancel => {
            dialogue.exit().await?;
            bot.send_message(msg.chat.id, "Cancelled.").await?;
        }
    }

    Ok(())
}

/// Handles plain messages outside of any dialogue: menu buttons, or a hint.
async fn handle_message(
    bot: Bot,
    msg: Message,
    dialogue: InventoryDialogue,
    store: SharedStore,
) -> HandlerResult {
    let action = msg.text().and_then(|text| MENU_ACTIONS.get(text.trim()));

    match action {
        Some(cmd) => {
            log::info!("Menu selection {:?} in chat {}", cmd, msg.chat.id);
            run_command(bot, msg, cmd.clone(), dialogue, store).await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                "I don't understand that. Please use the menu or type /help for available commands.",
            )
            .await?;
        }
    }

    Ok(())
}

fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(VIEW_INVENTORY_BUTTON),
            KeyboardButton::new(CHECK_EXPIRY_BUTTON),
        ],
        vec![
            KeyboardButton::new(ADD_MEDICINE_BUTTON),
            KeyboardButton::new(REMOVE_MEDICINE_BUTTON),
        ],
    ])
    .resize_keyboard()
}

/// Sends `text`, split across as many messages as Telegram requires.
pub(crate) async fn send_long(bot: &Bot, chat_id: ChatId, text: &str) -> HandlerResult {
    for chunk in split_message(text, MAX_MESSAGE_LEN) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Logs a storage failure and tells the user what happened.
pub(crate) async fn report_store_error(
    bot: &Bot,
    chat_id: ChatId,
    err: &StoreError,
) -> HandlerResult {
    log::error!("Inventory operation failed: {}", err);
    bot.send_message(chat_id, store_error_reply(err)).await?;
    Ok(())
}

pub fn store_error_reply(err: &StoreError) -> String {
    match err {
        StoreError::Unavailable(_) => {
            "The inventory database is unavailable right now. Please try again later.".to_string()
        }
        StoreError::ConstraintViolated(message) => {
            format!("The inventory rejected that change: {}", message)
        }
        StoreError::NotFound(id) => format!("No medicine with id {} was found.", id),
        StoreError::Database(_) => {
            "Something went wrong while talking to the inventory database.".to_string()
        }
    }
}
