use dotenvy::dotenv;
use envconfig::Envconfig;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::*};

use pharmasync::{
    config::{Config, DatabaseConfig},
    db::{init_db, DatabaseTarget},
    handlers::{self, Error, State},
    services::schedule_expiry_alerts,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize the logger with default settings or "info" level if not specified
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting PharmaSync...");

    // Load environment variables from a .env file if present
    dotenv().ok();

    let config = Config::init_from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        e
    })?;
    let db_config = DatabaseConfig::init_from_env()?;

    // A database that cannot be reached at startup is fatal.
    let target = DatabaseTarget::from_config(&db_config)?;
    let store = init_db(target, db_config.db_max_connections)
        .await
        .map_err(|e| {
            log::error!("Database connection failed: {}", e);
            e
        })?;

    let bot = Bot::new(&config.telegram_bot_token);

    match config.pharmacy_chat_id {
        Some(chat_id) => {
            schedule_expiry_alerts(
                store.clone(),
                bot.clone(),
                ChatId(chat_id),
                &config.expiry_alert_cron,
                config.expiry_alert_days,
            )
            .await?;
        }
        None => log::info!("PHARMACY_CHAT_ID not set, expiry alerts disabled"),
    }

    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![store, InMemStorage::<State>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Shutting down gracefully");
    Ok(())
}
