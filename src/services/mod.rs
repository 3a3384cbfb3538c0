use crate::{
    db::{
        models::{latest_storable_date, Medicine},
        SharedStore,
    },
    utils::{escape_markdown, format_date},
};
use chrono::{Days, Local, NaiveDate};
use futures::future;
use teloxide::prelude::*;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Schedules alerts for medicines nearing expiry.
///
/// Registers a `tokio_cron_scheduler` job on `cron` that looks up every
/// medicine expiring within `horizon_days` of today and posts one alert per
/// medicine to `chat_id`.
///
/// Returns:
/// - `Ok(())` if the job is successfully scheduled and started.
/// - `Err(..)` if the cron expression is invalid or the scheduler fails to start.
pub async fn schedule_expiry_alerts(
    store: SharedStore,
    bot: Bot,
    chat_id: ChatId,
    cron: &str,
    horizon_days: u32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sched = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _l| {
        let bot = bot.clone();
        let store = store.clone();
        Box::pin(async move {
            let today = Local::now().date_naive();
            match check_and_notify_expiring_medicines(&store, &bot, chat_id, today, horizon_days)
                .await
            {
                Ok(sent) => log::info!("Expiry check completed, {} alert(s) sent", sent),
                Err(e) => log::error!("Error checking expiring medicines: {}", e),
            }
        })
    })
    .map_err(|e| {
        log::error!("Failed to create expiry job: {}", e);
        e
    })?;

    sched.add(job).await.map_err(|e| {
        log::error!("Failed to add job to scheduler: {}", e);
        e
    })?;

    sched.start().await?;

    log::info!(
        "Expiry alerts scheduled ({}, {} day horizon)",
        cron,
        horizon_days
    );
    Ok(())
}

/// Looks up medicines expiring within the horizon and alerts `chat_id` about each.
///
/// Sends are issued concurrently; a failed send is logged and does not stop
/// the others. Returns the number of alerts delivered.
pub async fn check_and_notify_expiring_medicines(
    store: &SharedStore,
    bot: &Bot,
    chat_id: ChatId,
    today: NaiveDate,
    horizon_days: u32,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let threshold = alert_threshold(today, horizon_days);
    let medicines = store.query_expiring_by(threshold).await?;

    let notification_futures: Vec<_> = medicines
        .iter()
        .map(|medicine| send_expiry_notification(bot, chat_id, medicine, today))
        .collect();

    let results = future::join_all(notification_futures).await;

    let mut sent = 0;
    for result in results {
        match result {
            Ok(()) => sent += 1,
            Err(e) => log::error!("Failed to send expiry alert: {}", e),
        }
    }

    Ok(sent)
}

/// The last expiry date that still triggers an alert.
///
/// Horizons reaching past the latest storable date alert on everything.
pub fn alert_threshold(today: NaiveDate, horizon_days: u32) -> NaiveDate {
    let latest = latest_storable_date();
    today
        .checked_add_days(Days::new(horizon_days.into()))
        .map_or(latest, |threshold| threshold.min(latest))
}

/// Builds the MarkdownV2 alert body for one medicine.
pub fn expiry_alert_message(medicine: &Medicine, today: NaiveDate) -> String {
    let days_until_expiry = (medicine.expiry_date - today).num_days();

    let status = if days_until_expiry < 0 {
        format!("Expired {} day(s) ago", -days_until_expiry)
    } else {
        format!("Days until expiry: {}", days_until_expiry)
    };

    format!(
        "⚠️ *Medicine Expiry Alert*\n\n\
        *Name:* `{}`\n\
        *Expiry Date:* `{}`\n\
        *{}*\n\
        *Quantity:* `{}`\n\
        Please check and take appropriate action\\.",
        escape_markdown(&medicine.name),
        format_date(medicine.expiry_date),
        escape_markdown(&status),
        medicine.quantity,
    )
}

async fn send_expiry_notification(
    bot: &Bot,
    chat_id: ChatId,
    medicine: &Medicine,
    today: NaiveDate,
) -> Result<(), teloxide::RequestError> {
    bot.send_message(chat_id, expiry_alert_message(medicine, today))
        .parse_mode(teloxide::types::ParseMode::MarkdownV2)
        .await?;
    Ok(())
}
