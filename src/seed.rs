use dotenvy::dotenv;
use envconfig::Envconfig;

use pharmasync::{
    config::DatabaseConfig,
    db::{init_db, models::NewMedicine, DatabaseTarget, SharedStore, StoreError},
};

const SEED_MEDICINES: &str = include_str!("../fixtures/medicines.json");

fn get_seed_data() -> Result<Vec<NewMedicine>, serde_json::Error> {
    serde_json::from_str(SEED_MEDICINES)
}

pub async fn seed_database(
    store: &SharedStore,
    medicines: &[NewMedicine],
) -> Result<usize, StoreError> {
    for medicine in medicines {
        store.insert(medicine).await?;
    }

    Ok(medicines.len())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok();

    let config = DatabaseConfig::init_from_env()?;
    let target = DatabaseTarget::from_config(&config)?;
    let medicines = get_seed_data()?;
    let store = init_db(target, config.db_max_connections).await?;

    let seeded = seed_database(&store, &medicines).await?;
    log::info!("Seeded {} medicines", seeded);
    Ok(())
}
