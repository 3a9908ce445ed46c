use env_logger::Builder;
use log::LevelFilter;
use personas_api::config::AppConfig;
use personas_api::seed;
use personas_api::store::PostgresStore;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    let database_url = config.database_url();
    let store = match PostgresStore::connect(&database_url, &config.database).await {
        Ok(store) => store,
        Err(e) => {
            log::error!("Error al conectar a la base de datos: {:#}", e);
            std::process::exit(1);
        }
    };
    log::info!("PostgreSQL conectado: {}", store.host());

    store.migrate().await?;
    let store = Arc::new(store);

    // Load seed data for demonstration (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        let inserted = seed::load_seed_data(&*store).await?;
        log::info!("Seed data loaded: {} personas", inserted.len());
    }

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Servidor corriendo en http://{}", bind_address);
    log::info!(
        "API documentation available at http://{}/api-docs",
        bind_address
    );

    personas_api::serve(
        listener,
        store.clone(),
        &config,
        personas_api::shutdown_signal(),
    )
    .await?;

    match personas_api::close_store(&*store).await {
        Ok(()) => {
            log::info!("Conexión a la base de datos cerrada");
            Ok(())
        }
        Err(e) => {
            log::error!("Error al cerrar la conexión: {:#}", e);
            std::process::exit(1);
        }
    }
}
