//! Reset the personas table to the bundled sample data.
//!
//! Usage: cargo run --bin seed-personas
//!
//! Uses the same configuration as the server (`DATABASE_URL`,
//! `PERSONAS_DATABASE__CONNECTION_STRING`, `config.toml`).

use anyhow::Result;
use personas_api::config::AppConfig;
use personas_api::seed;
use personas_api::store::{PersonaStore, PostgresStore, StoreLifecycle};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    if let Err(e) = run().await {
        log::error!("Error al poblar la base de datos: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load()?;
    let store = PostgresStore::connect(&config.database_url(), &config.database).await?;
    log::info!("Conectado a PostgreSQL en {}", store.host());
    store.migrate().await?;

    let inserted = seed::reset_with_seed_data(&store).await?;
    log::info!("{} personas insertadas exitosamente", inserted.len());

    let total = store.count_personas(None).await?;
    log::info!("Total de personas en la base de datos: {}", total);

    for (index, persona) in inserted.iter().enumerate() {
        log::info!(
            "{}. {} - Cédula: {}",
            index + 1,
            persona.full_name(),
            persona.cedula
        );
    }

    store.close().await;
    log::info!("Base de datos poblada exitosamente");
    Ok(())
}
